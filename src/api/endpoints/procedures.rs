use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct ReloadResponse {
    pub ok: bool,
    pub count: usize,
}

/// `POST /api/reload-procedures`: rebuild the corpus from its source.
/// The previous corpus stays in service if the load fails.
pub async fn reload(State(ctx): State<ApiContext>) -> Result<Json<ReloadResponse>, ApiError> {
    let core = ctx.core.clone();
    let count = tokio::task::spawn_blocking(move || core.reload_corpus()).await??;

    Ok(Json(ReloadResponse { ok: true, count }))
}
