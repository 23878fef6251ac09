use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imgedit_core::engine::EngineError;
use imgedit_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds request-body rejections.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `imgedit_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::UpstreamTransport(msg) => (
                    StatusCode::BAD_REQUEST,
                    "IMAGE_FETCH_FAILED",
                    format!("Failed to fetch image: {msg}"),
                ),
                CoreError::UpstreamDomain(engine) => {
                    (StatusCode::BAD_GATEWAY, engine_code(engine), engine.to_string())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Overloaded(msg) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "OVERLOADED", msg.clone())
                }
                CoreError::Unexpected(msg) => {
                    tracing::error!(error = %msg, "Unexpected core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // Malformed or incomplete request bodies.
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn engine_code(err: &EngineError) -> &'static str {
    match err {
        EngineError::InvalidModel(_) => "INVALID_MODEL",
        EngineError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
        EngineError::TemporarilyBlocked(_) => "TEMPORARILY_BLOCKED",
        EngineError::Timeout(_) => "ENGINE_TIMEOUT",
        EngineError::Generation(_) => "GENERATION_FAILED",
    }
}
