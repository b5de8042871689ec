//! API surface: routing, the OpenAPI document, service endpoints, and
//! the shared error-to-response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use utoipa::{OpenApi, ToSchema};

use storm_core::config::CredentialStatus;
use storm_core::engine::Retriever;
use storm_core::StormError;

use crate::SharedState;

pub mod core;
pub mod wiki;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/generate", post(wiki::generate))
        .route("/stream-article", post(wiki::stream_article))
        .route("/core", post(core::run_core))
        .route("/core/stream", post(core::run_core_stream))
        .route("/api/v1/openapi.json", get(openapi))
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "STORM API",
        version = "1.0.0",
        description = "Wiki article generation pipeline"
    ),
    paths(
        health,
        status,
        wiki::generate,
        wiki::stream_article,
        core::run_core,
        core::run_core_stream
    ),
    components(schemas(
        HealthResponse,
        StatusResponse,
        wiki::TopicRequest,
        wiki::WikiResponse,
        core::CoreRequest
    )),
    tags(
        (name = "service", description = "Liveness and configuration"),
        (name = "wiki", description = "Article generation"),
        (name = "core", description = "Full pipeline access")
    )
)]
struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Errors leaving the API. Every variant serializes as `{"detail": ...}`
/// like the rest of the surface.
#[derive(Debug)]
pub enum ApiError {
    /// Request failed validation.
    Validation(String),
    /// The pipeline failed.
    Pipeline(StormError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }
}

impl From<StormError> for ApiError {
    fn from(err: StormError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, detail) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Pipeline(err) => {
                tracing::error!("request failed: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (code, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    status: &'static str,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize, ToSchema)]
struct StatusResponse {
    status: &'static str,
    lm_backend: &'static str,
    default_retriever: &'static str,
    #[schema(value_type = Object)]
    credentials: CredentialStatus,
}

/// Configuration status: backend selection and which credentials are
/// present. Booleans only, never key material.
#[utoipa::path(
    get,
    path = "/status",
    tag = "service",
    responses(
        (status = 200, description = "Resolved configuration", body = StatusResponse)
    )
)]
async fn status(
    axum::extract::State(state): axum::extract::State<SharedState>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        lm_backend: state.config.lm.api_type.as_str(),
        default_retriever: Retriever::by_priority(&state.config.search).name(),
        credentials: state.config.credential_status(),
    })
}
