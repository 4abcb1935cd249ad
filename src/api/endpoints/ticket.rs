use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;
use crate::pipeline::plan::TicketAssistOutcome;
use crate::ticket_log::{
    log_itinerary, log_ticket, LogOutcome, SolvedFlag, TicketLogEntry, TicketLogError,
};

/// Shorter pastes are rejected before the pipeline runs.
pub const MIN_TICKET_CHARS: usize = 20;

fn default_use_ai() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAssistRequest {
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub agent_email: String,
    #[serde(default)]
    pub call_center: String,
    #[serde(default)]
    pub raw_ticket_text: String,
    #[serde(default)]
    pub solved: SolvedFlag,
    #[serde(default = "default_use_ai", rename = "useAI")]
    pub use_ai: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAssistResponse {
    pub latency_ms: u64,
    #[serde(flatten)]
    pub log: LogOutcome,
    pub itinerary: String,
    #[serde(flatten)]
    pub outcome: TicketAssistOutcome,
}

/// `POST /api/ticket-assist`: plan for a pasted ticket, then a ticket log
/// row. Logging problems are reported in `saveError`, never as a failure.
pub async fn assist(
    State(ctx): State<ApiContext>,
    payload: Result<Json<TicketAssistRequest>, JsonRejection>,
) -> Result<Json<TicketAssistResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.raw_ticket_text.trim().chars().count() < MIN_TICKET_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Paste the ticket text (at least {MIN_TICKET_CHARS} chars)."
        )));
    }

    let core = ctx.core.clone();
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let result = assist_and_log(&core, &request, || tx.is_closed());
        let _ = tx.send(result);
    });
    // A dropped handler closes the channel; the blocking task then skips
    // the log row. A panic in the task drops the sender.
    let (outcome, log, itinerary) = rx
        .await
        .map_err(|_| ApiError::Internal("ticket assist task ended without a result".into()))??;

    tracing::info!(
        mode = %outcome.mode,
        picked = outcome.rag.picked.len(),
        saved = log.saved,
        "Ticket assist completed"
    );

    Ok(Json(TicketAssistResponse {
        latency_ms: started.elapsed().as_millis() as u64,
        itinerary,
        log,
        outcome,
    }))
}

/// Plan the ticket, then append its log row unless `abandoned` reports that
/// nobody is waiting for the answer any more. Blocking.
fn assist_and_log(
    core: &CoreState,
    request: &TicketAssistRequest,
    abandoned: impl Fn() -> bool,
) -> Result<(TicketAssistOutcome, LogOutcome, String), ApiError> {
    let outcome = core.ticket_assist(&request.raw_ticket_text, request.use_ai)?;
    let itinerary = log_itinerary(&request.raw_ticket_text, &outcome.parsed.itinerary);

    if abandoned() {
        tracing::info!("Client went away; ticket log skipped");
        let log = LogOutcome {
            saved: false,
            save_error: TicketLogError::Cancelled.to_string(),
        };
        return Ok((outcome, log, itinerary));
    }

    let entry = TicketLogEntry::new(
        &request.agent_name,
        &request.agent_email,
        &itinerary,
        &request.solved,
        &request.call_center,
        &outcome.plan_text,
    );
    let log = log_ticket(core.ticket_log(), &entry);
    Ok((outcome, log, itinerary))
}
