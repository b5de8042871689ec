//! Core endpoints: the full pipeline with every knob exposed, collected
//! or streamed artifact-by-artifact over SSE.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::Value;
use tokio_stream::StreamExt;
use utoipa::ToSchema;

use storm_core::encoding::safe_json_serialize;
use storm_core::engine::RunRequest;

use super::ApiError;
use crate::SharedState;

#[derive(Deserialize, ToSchema)]
pub struct CoreRequest {
    pub topic: String,
    #[serde(default = "default_three")]
    pub max_conv_turn: u32,
    #[serde(default = "default_three")]
    pub max_perspective: u32,
    #[serde(default = "default_three")]
    pub search_top_k: u32,
    #[serde(default = "default_three")]
    pub max_thread_num: u32,
    /// Retriever name; omitted selects by credential priority.
    #[serde(default)]
    pub retriever: Option<String>,
    /// Accepted for payload compatibility; `/core` always collects.
    /// Use `/core/stream` for the artifact event stream.
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_true")]
    pub do_research: bool,
    #[serde(default = "default_true")]
    pub do_generate_outline: bool,
    #[serde(default = "default_true")]
    pub do_generate_article: bool,
    #[serde(default = "default_true")]
    pub do_polish_article: bool,
}

fn default_three() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

impl CoreRequest {
    fn into_run_request(self) -> Result<RunRequest, ApiError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(ApiError::validation("topic must not be empty"));
        }
        let mut request = RunRequest::new(topic);
        request.max_conv_turn = self.max_conv_turn;
        request.max_perspective = self.max_perspective;
        request.search_top_k = self.search_top_k;
        request.max_thread_num = self.max_thread_num;
        request.retriever = self.retriever;
        request.do_research = self.do_research;
        request.do_generate_outline = self.do_generate_outline;
        request.do_generate_article = self.do_generate_article;
        request.do_polish_article = self.do_polish_article;
        Ok(request)
    }
}

/// Run the pipeline and return the collected artifact bundle.
#[utoipa::path(
    post,
    path = "/core",
    tag = "core",
    request_body = CoreRequest,
    responses(
        (status = 200, description = "Collected artifacts", body = Object),
        (status = 422, description = "Invalid request"),
        (status = 500, description = "Pipeline failure")
    )
)]
pub async fn run_core(
    State(state): State<SharedState>,
    Json(req): Json<CoreRequest>,
) -> Result<Response, ApiError> {
    let request = req.into_run_request()?;
    let bundle = state.adapter.collect(&request).await?;
    let encoded: Value = serde_json::from_str(&safe_json_serialize(&bundle))
        .map_err(|e| ApiError::Pipeline(storm_core::StormError::Serialization(e.to_string())))?;
    Ok(Json(encoded).into_response())
}

/// Run the pipeline and stream each artifact as an SSE frame the moment
/// it is produced. The stream always ends with a terminal `complete` or
/// `error` event.
#[utoipa::path(
    post,
    path = "/core/stream",
    tag = "core",
    request_body = CoreRequest,
    responses(
        (status = 200, description = "Artifact event stream", content_type = "text/event-stream"),
        (status = 422, description = "Invalid request")
    )
)]
pub async fn run_core_stream(
    State(state): State<SharedState>,
    Json(req): Json<CoreRequest>,
) -> Result<Response, ApiError> {
    let request = req.into_run_request()?;
    Ok(sse_response(&state, request))
}

fn sse_response(state: &SharedState, request: RunRequest) -> Response {
    let stream = state
        .adapter
        .stream(request)
        .map(|event| Ok::<_, Infallible>(Event::default().data(safe_json_serialize(&event))));
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use storm_core::ArtifactKey;
    use tower::ServiceExt;

    use crate::api::tests::{body_json, test_app, ScriptedEngine};

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_core_returns_bundle_with_topic() {
        let app = test_app(ScriptedEngine {
            artifacts: vec![
                (ArtifactKey::ConversationLog, json!([{"perspective": "history"}])),
                (ArtifactKey::StormGenArticle, json!("body text")),
            ],
            fail_with: None,
        });
        let response = app
            .oneshot(post_json("/core", json!({"topic": "Bridges"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["topic"], "Bridges");
        assert_eq!(body["conversation_log"][0]["perspective"], "history");
        assert_eq!(body["storm_gen_article"], "body text");
    }

    #[tokio::test]
    async fn test_core_rejects_blank_topic() {
        let app = test_app(ScriptedEngine {
            artifacts: vec![],
            fail_with: None,
        });
        let response = app
            .oneshot(post_json("/core", json!({"topic": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    fn parse_sse_frames(raw: &str) -> Vec<Value> {
        raw.split("\n\n")
            .filter_map(|frame| frame.strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_core_stream_emits_artifacts_then_complete() {
        let app = test_app(ScriptedEngine {
            artifacts: vec![
                (ArtifactKey::StormGenOutline, json!("# Outline")),
                (ArtifactKey::StormGenArticle, json!("article")),
            ],
            fail_with: None,
        });
        let response = app
            .oneshot(post_json("/core/stream", json!({"topic": "Rust"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let frames = parse_sse_frames(&String::from_utf8(bytes.to_vec()).unwrap());
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0]["phase"], "storm_gen_outline");
        assert_eq!(frames[1]["phase"], "storm_gen_article");
        assert_eq!(frames[2]["phase"], "complete");
        assert_eq!(frames[2]["content"], true);
    }

    #[tokio::test]
    async fn test_core_stream_flag_is_accepted_but_still_collects() {
        let app = test_app(ScriptedEngine {
            artifacts: vec![(ArtifactKey::StormGenArticle, json!("article"))],
            fail_with: None,
        });
        let response = app
            .oneshot(post_json(
                "/core",
                json!({"topic": "Rust", "stream": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        let body = body_json(response).await;
        assert_eq!(body["storm_gen_article"], "article");
    }

    #[tokio::test]
    async fn test_core_stream_ends_with_error_event_on_failure() {
        let app = test_app(ScriptedEngine {
            artifacts: vec![(ArtifactKey::ConversationLog, json!([]))],
            fail_with: Some("boom".into()),
        });
        let response = app
            .oneshot(post_json("/core/stream", json!({"topic": "Rust"})))
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let frames = parse_sse_frames(&String::from_utf8(bytes.to_vec()).unwrap());
        let last = frames.last().unwrap();
        assert_eq!(last["phase"], "error");
        assert!(last["content"].as_str().unwrap().contains("boom"));
    }
}
