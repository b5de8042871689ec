//! Wiki endpoints: one-shot article generation and the plaintext
//! chunked article stream.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use storm_core::engine::RunRequest;
use storm_core::stream::{cluster_chunks, emit, word_chunks};
use storm_core::ResultBundle;

use super::ApiError;
use crate::SharedState;

#[derive(Deserialize, ToSchema)]
pub struct TopicRequest {
    pub topic: String,
}

/// Pipeline knobs, all optional. Defaults match a full run.
#[derive(Deserialize)]
pub struct WikiParams {
    #[serde(default = "default_three")]
    pub max_conv_turn: u32,
    #[serde(default = "default_three")]
    pub max_perspective: u32,
    #[serde(default = "default_three")]
    pub search_top_k: u32,
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

/// The `/generate` payload: the six article-facing artifacts. The
/// conversation log stays internal to this endpoint; `/core` exposes
/// the full bundle.
#[derive(Serialize, ToSchema)]
pub struct WikiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_gen_outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_gen_outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_gen_article: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_gen_article_polished: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub url_to_info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub raw_search_results: Option<serde_json::Value>,
}

impl From<ResultBundle> for WikiResponse {
    fn from(bundle: ResultBundle) -> Self {
        Self {
            direct_gen_outline: bundle.direct_gen_outline,
            storm_gen_outline: bundle.storm_gen_outline,
            storm_gen_article: bundle.storm_gen_article,
            storm_gen_article_polished: bundle.storm_gen_article_polished,
            url_to_info: bundle.url_to_info,
            raw_search_results: bundle.raw_search_results,
        }
    }
}

fn run_request(topic: &str, params: &WikiParams) -> Result<RunRequest, ApiError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ApiError::validation("topic must not be empty"));
    }
    let mut request = RunRequest::new(topic);
    request.max_conv_turn = params.max_conv_turn;
    request.max_perspective = params.max_perspective;
    request.search_top_k = params.search_top_k;
    request.do_research = params.do_research;
    request.do_generate_outline = params.do_generate_outline;
    request.do_generate_article = params.do_generate_article;
    request.do_polish_article = params.do_polish_article;
    Ok(request)
}

/// Run the pipeline and return every produced artifact in one response.
#[utoipa::path(
    post,
    path = "/generate",
    tag = "wiki",
    request_body = TopicRequest,
    responses(
        (status = 200, description = "Generated artifacts", body = WikiResponse),
        (status = 422, description = "Invalid topic"),
        (status = 500, description = "Pipeline failure")
    )
)]
pub async fn generate(
    State(state): State<SharedState>,
    Query(params): Query<WikiParams>,
    Json(req): Json<TopicRequest>,
) -> Result<Json<WikiResponse>, ApiError> {
    let request = run_request(&req.topic, &params)?;
    let bundle = state.adapter.collect(&request).await?;
    Ok(Json(WikiResponse::from(bundle)))
}

/// Chunking strategy for the plaintext article stream.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    #[default]
    Word,
    Cluster,
}

#[derive(Deserialize)]
pub struct StreamParams {
    #[serde(default)]
    pub mode: StreamMode,
}

/// Run the pipeline, then stream the finished article as plaintext
/// chunks with human-paced delays.
#[utoipa::path(
    post,
    path = "/stream-article",
    tag = "wiki",
    request_body = TopicRequest,
    params(
        ("mode" = Option<String>, Query, description = "Chunking strategy: word (default) or cluster")
    ),
    responses(
        (status = 200, description = "Chunked plaintext article", content_type = "text/plain"),
        (status = 422, description = "Invalid topic"),
        (status = 500, description = "Pipeline failure")
    )
)]
pub async fn stream_article(
    State(state): State<SharedState>,
    Query(knobs): Query<WikiParams>,
    Query(params): Query<StreamParams>,
    Json(req): Json<TopicRequest>,
) -> Result<Response, ApiError> {
    let request = run_request(&req.topic, &knobs)?;

    // The article has to exist before it can be paced out.
    let bundle = state.adapter.collect(&request).await?;
    let text = bundle.streamable_article().unwrap_or_default().to_string();
    let chunks = match params.mode {
        StreamMode::Word => word_chunks(&text),
        StreamMode::Cluster => cluster_chunks(&text, &mut rand::thread_rng()),
    };

    let stream = emit(chunks).map(|piece| Ok::<_, Infallible>(Bytes::from(piece)));
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}
