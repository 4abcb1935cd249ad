use serde::{Deserialize, Serialize};

use crate::pipeline::extraction::ExtractedFields;
use crate::pipeline::rag::types::RetrievalResult;

/// How the plan text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanMode {
    /// Generator rewrote the plan using the retrieved snippets.
    #[serde(rename = "ai+rag")]
    AiRag,
    /// Deterministic template only (augmentation off, unavailable or failed).
    #[serde(rename = "rag-only")]
    RagOnly,
}

impl std::fmt::Display for PlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AiRag => write!(f, "ai+rag"),
            Self::RagOnly => write!(f, "rag-only"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub suggested_macros: Vec<String>,
    pub suggested_tags: Vec<String>,
}

/// Template output before any augmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterministicPlan {
    pub plan_text: String,
    pub recommendations: Recommendations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_text: String,
    pub recommendations: Recommendations,
    pub mode: PlanMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn: Option<String>,
}

/// Everything the presentation layer needs for one ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAssistOutcome {
    pub ok: bool,
    pub mode: PlanMode,
    pub parsed: ExtractedFields,
    pub rag: RetrievalResult,
    pub plan_text: String,
    pub recommendations: Recommendations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn: Option<String>,
}
