use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::rag::types::RetrievalResult;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub scenario: String,
    #[serde(default)]
    pub question: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub ok: bool,
    pub answer: String,
    pub rag: RetrievalResult,
    pub latency_ms: u64,
}

/// `POST /api/ask`: free-form procedure question answered by the
/// generator over retrieved snippets. No template fallback: an unavailable
/// generator is 503, a failed call is 502.
pub async fn ask(
    State(ctx): State<ApiContext>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.question.trim().is_empty() {
        return Err(ApiError::BadRequest("Question is required.".into()));
    }

    let core = ctx.core.clone();
    let answer =
        tokio::task::spawn_blocking(move || core.ask(&request.scenario, &request.question)).await??;

    Ok(Json(AskResponse {
        ok: true,
        answer: answer.answer,
        rag: answer.rag,
        latency_ms: started.elapsed().as_millis() as u64,
    }))
}
