//! Liveness and corpus status.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Sheet allowlist as reported to clients: `"ALL"` when unfiltered.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SheetsFilter {
    All(&'static str),
    Only(Vec<String>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub app: &'static str,
    pub version: &'static str,
    pub corpus_source: String,
    pub sheets_filter: SheetsFilter,
    pub procedures: usize,
    /// Model name when text generation is configured.
    pub generator: Option<String>,
    pub ticket_log: bool,
    pub time: String,
}

/// `GET /health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let core = &ctx.core;
    let sheets = &core.config().sheets;

    Ok(Json(HealthResponse {
        ok: true,
        app: crate::config::APP_NAME,
        version: crate::config::APP_VERSION,
        corpus_source: core.corpus_source(),
        sheets_filter: if sheets.is_empty() {
            SheetsFilter::All("ALL")
        } else {
            SheetsFilter::Only(sheets.clone())
        },
        procedures: core.corpus()?.len(),
        generator: core.generator().map(|g| g.model().to_string()),
        ticket_log: core.ticket_log().is_some(),
        time: chrono::Utc::now().to_rfc3339(),
    }))
}
