//! Ticket log persistence.
//!
//! One row per assisted ticket, appended through a webhook (an Apps Script
//! web app in production). Logging never blocks the plan: every failure is
//! reported back to the caller as a "not saved" outcome.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use hkdf::hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::TicketLogConfig;
use crate::pipeline::extraction::rules::{pick_first, ExtractionRule};

/// Header carrying the hex HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "X-Signature";

const WEBHOOK_TIMEOUT_SECS: u64 = 20;
const MAX_RESPONSE_PREVIEW_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum TicketLogError {
    #[error("Ticket logging is not configured")]
    NotConfigured,

    #[error("Not saved: agentName and agentEmail are required.")]
    MissingAgent,

    #[error("Not saved: itinerary not found in the pasted ticket.")]
    MissingItinerary,

    #[error("Not saved: request was cancelled.")]
    Cancelled,

    #[error("Invalid signing key")]
    Signing,

    #[error("Webhook request failed: {0}")]
    Request(String),

    #[error("Webhook response not JSON ({status}): {preview}")]
    NotJson { status: u16, preview: String },

    #[error("Webhook rejected entry ({status}): {reason}")]
    Rejected { status: u16, reason: String },
}

/// Solved flag as sent by clients: a boolean or a `"YES"`/`"NO"` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SolvedFlag {
    Flag(bool),
    Text(String),
}

impl SolvedFlag {
    pub fn is_solved(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Text(s) => s.trim().eq_ignore_ascii_case("yes"),
        }
    }

    pub fn as_yes_no(&self) -> &'static str {
        if self.is_solved() {
            "YES"
        } else {
            "NO"
        }
    }
}

impl Default for SolvedFlag {
    fn default() -> Self {
        Self::Flag(false)
    }
}

/// Row written to the ticket log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLogEntry {
    pub ts: String,
    pub agent_name: String,
    pub agent_email: String,
    pub itinerary: String,
    pub solved: &'static str,
    pub call_center: String,
    pub ticket_plan_output: String,
}

impl TicketLogEntry {
    pub fn new(
        agent_name: &str,
        agent_email: &str,
        itinerary: &str,
        solved: &SolvedFlag,
        call_center: &str,
        plan_text: &str,
    ) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            agent_name: agent_name.trim().to_string(),
            agent_email: agent_email.trim().to_string(),
            itinerary: itinerary.trim().to_string(),
            solved: solved.as_yes_no(),
            call_center: call_center.trim().to_string(),
            ticket_plan_output: plan_text.trim().to_string(),
        }
    }

    /// Precondition check before anything is sent.
    pub fn validate(&self) -> Result<(), TicketLogError> {
        if self.agent_name.is_empty() || self.agent_email.is_empty() {
            return Err(TicketLogError::MissingAgent);
        }
        if self.itinerary.is_empty() {
            return Err(TicketLogError::MissingItinerary);
        }
        Ok(())
    }
}

/// Append-only destination for ticket log rows.
pub trait TicketLogSink: Send + Sync {
    fn append(&self, entry: &TicketLogEntry) -> Result<(), TicketLogError>;
}

/// Reported back to the caller alongside the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogOutcome {
    pub saved: bool,
    pub save_error: String,
}

/// Lenient itinerary scan over the raw paste, used only for the log row.
/// Case-insensitive throughout; the parenthesised form wins.
static LOG_ITINERARY_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("parenthesised", r"(?i)\(([A-Z]\d{6,})\)"),
        ExtractionRule::new(
            "confirmation_label",
            r"(?i)itinerary/confirmation\s*number\s*([A-Z]\d{6,})",
        ),
        ExtractionRule::new("itinerary_hash", r"(?i)itinerary\s*#\s*([A-Z]\d{6,})"),
        ExtractionRule::new("hotel_code", r"(?i)\b(H\d{6,})\b"),
    ]
});

/// Itinerary for the log row: the extracted one when present, otherwise
/// the lenient raw-text scan, upper-cased. Empty when nothing matches.
pub fn log_itinerary(raw: &str, extracted: &str) -> String {
    if !extracted.trim().is_empty() {
        return extracted.to_string();
    }
    pick_first(raw, &LOG_ITINERARY_RULES).to_uppercase()
}

/// Validate and append. Failures are logged and folded into the outcome.
pub fn log_ticket(sink: Option<&dyn TicketLogSink>, entry: &TicketLogEntry) -> LogOutcome {
    let result = entry
        .validate()
        .and_then(|()| sink.ok_or(TicketLogError::NotConfigured))
        .and_then(|sink| sink.append(entry));

    match result {
        Ok(()) => {
            tracing::info!(itinerary = %entry.itinerary, "Ticket logged");
            LogOutcome {
                saved: true,
                save_error: String::new(),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ticket not logged");
            LogOutcome {
                saved: false,
                save_error: e.to_string(),
            }
        }
    }
}

/// Hex HMAC-SHA256 of `body`.
pub fn sign_body(secret: &str, body: &[u8]) -> Result<String, TicketLogError> {
    let mut mac =
        <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes()).map_err(|_| TicketLogError::Signing)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Deserialize)]
struct WebhookReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Webhook sink: JSON POST, optionally signed.
pub struct WebhookTicketLog {
    config: TicketLogConfig,
}

impl WebhookTicketLog {
    pub fn new(config: TicketLogConfig) -> Self {
        Self { config }
    }
}

impl TicketLogSink for WebhookTicketLog {
    fn append(&self, entry: &TicketLogEntry) -> Result<(), TicketLogError> {
        let body = serde_json::to_vec(entry).map_err(|e| TicketLogError::Request(e.to_string()))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| TicketLogError::Request(e.to_string()))?;

        let mut request = client
            .post(&self.config.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.config.shared_secret {
            request = request.header(SIGNATURE_HEADER, sign_body(secret, &body)?);
        }

        let response = request
            .body(body)
            .send()
            .map_err(|e| TicketLogError::Request(e.to_string()))?;

        let status = response.status();
        let text = response.text().unwrap_or_default();
        interpret_reply(status.as_u16(), status.is_success(), &text)
    }
}

fn interpret_reply(status: u16, success: bool, text: &str) -> Result<(), TicketLogError> {
    let reply: WebhookReply = serde_json::from_str(text).map_err(|_| TicketLogError::NotJson {
        status,
        preview: text.chars().take(MAX_RESPONSE_PREVIEW_CHARS).collect(),
    })?;

    if !success || !reply.ok {
        return Err(TicketLogError::Rejected {
            status,
            reason: reply
                .error
                .unwrap_or_else(|| format!("request failed ({status})")),
        });
    }
    Ok(())
}
