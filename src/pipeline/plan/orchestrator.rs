use serde::Serialize;

use super::synthesize;
use super::types::TicketAssistOutcome;
use crate::pipeline::extraction::{extract_fields, ExtractedFields};
use crate::pipeline::rag::corpus::ProcedureCorpus;
use crate::pipeline::rag::generator::LlmGenerate;
use crate::pipeline::rag::prompt::build_ask_messages;
use crate::pipeline::rag::retrieval::{search, RetrievalOptions};
use crate::pipeline::rag::types::RetrievalResult;
use crate::pipeline::rag::GenerationError;
use crate::pipeline::safety::{normalize_ticket_text, redact_pii};

/// Used when the ticket yields none of the query parts. Unreachable while
/// the RPP part is unconditional; kept as the floor if that part changes.
pub const FALLBACK_QUERY: &str = "ticket refund cancellation procedure";

/// Retrieval query from the extracted fields: labelled parts joined by `" | "`.
///
/// The RPP part (`Has RPP` / `No/Unknown RPP`) is always present, so the
/// query is never empty in practice and [`FALLBACK_QUERY`] is not returned.
pub fn compose_query(fields: &ExtractedFields) -> String {
    let parts = [
        (!fields.subject.is_empty()).then(|| format!("Subject: {}", fields.subject)),
        (!fields.reason.is_empty()).then(|| format!("Reason: {}", fields.reason)),
        Some(if fields.has_rpp { "Has RPP" } else { "No/Unknown RPP" }.to_string()),
        fields.rp_denied.then(|| "RP denied".to_string()),
        fields
            .guest_asks_status
            .then(|| "Guest asked refund status update".to_string()),
    ];

    let query = parts.into_iter().flatten().collect::<Vec<_>>().join(" | ");
    if query.trim().is_empty() {
        FALLBACK_QUERY.to_string()
    } else {
        query
    }
}

/// Generator answer to a free-form procedure question.
#[derive(Debug, Clone, Serialize)]
pub struct AskAnswer {
    pub answer: String,
    pub rag: RetrievalResult,
}

/// Ticket assist over one corpus snapshot.
///
/// Flow: normalize → redact → extract → compose query → retrieve → synthesize.
/// Redaction happens before anything else sees the text, so neither the
/// generator nor the returned fields carry raw PII.
pub struct TicketAssistPipeline<'a> {
    corpus: &'a ProcedureCorpus,
    generator: Option<&'a dyn LlmGenerate>,
    options: &'a RetrievalOptions,
}

impl<'a> TicketAssistPipeline<'a> {
    pub fn new(
        corpus: &'a ProcedureCorpus,
        generator: Option<&'a dyn LlmGenerate>,
        options: &'a RetrievalOptions,
    ) -> Self {
        Self {
            corpus,
            generator,
            options,
        }
    }

    /// Run ticket assist. Never fails: generator problems degrade the mode
    /// and surface in `warn`.
    pub fn run(&self, raw_ticket_text: &str, use_ai: bool) -> TicketAssistOutcome {
        let redacted = redact_pii(&normalize_ticket_text(raw_ticket_text));
        let parsed = extract_fields(&redacted);

        let query = compose_query(&parsed);
        let rag = search(self.corpus, &query, self.options);
        tracing::debug!(picked = rag.picked.len(), "Procedures retrieved");

        let (augment, unavailable_warn) = match (use_ai, self.generator) {
            (true, Some(generator)) => (Some(generator), None),
            (true, None) => (None, Some(GenerationError::NotConfigured.to_string())),
            (false, _) => (None, None),
        };

        let plan = synthesize(&parsed, &rag.picked, augment);

        TicketAssistOutcome {
            ok: true,
            mode: plan.mode,
            parsed,
            rag,
            plan_text: plan.plan_text,
            recommendations: plan.recommendations,
            warn: plan.warn.or(unavailable_warn),
        }
    }

    /// Answer a procedure question from the matrix. Unlike ticket assist
    /// there is no template to fall back to, so generator errors propagate.
    pub fn ask(&self, scenario: &str, question: &str) -> Result<AskAnswer, GenerationError> {
        let generator = self.generator.ok_or(GenerationError::NotConfigured)?;

        let query = format!("{scenario}\n{question}").trim().to_string();
        let rag = search(self.corpus, &query, self.options);
        let answer = generator.generate(&build_ask_messages(scenario, question, &rag.picked))?;

        Ok(AskAnswer { answer, rag })
    }
}
