//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core_state::CoreError;
use crate::pipeline::rag::GenerationError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Corpus load failed: {0}")]
    CorpusLoad(String),
    #[error("Text generation is not configured")]
    GeneratorUnavailable,
    #[error("Text generation failed: {0}")]
    GeneratorFailed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::CorpusLoad(detail) => {
                tracing::error!(detail, "Corpus reload failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CORPUS_LOAD_FAILED",
                    detail.clone(),
                )
            }
            ApiError::GeneratorUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "GENERATOR_UNAVAILABLE",
                "Text generation is not configured".to_string(),
            ),
            ApiError::GeneratorFailed(detail) => {
                tracing::warn!(detail, "Generator call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATOR_FAILED",
                    detail.clone(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            ok: false,
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
            CoreError::Corpus(e) => ApiError::CorpusLoad(e.to_string()),
            CoreError::Generation(GenerationError::NotConfigured) => ApiError::GeneratorUnavailable,
            CoreError::Generation(e) => ApiError::GeneratorFailed(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
