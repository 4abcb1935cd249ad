pub mod orchestrator;
pub mod template;
pub mod types;

pub use orchestrator::{compose_query, AskAnswer, TicketAssistPipeline, FALLBACK_QUERY};
pub use template::build_ticket_plan;
pub use types::{Plan, PlanMode, Recommendations, TicketAssistOutcome};

use crate::pipeline::extraction::ExtractedFields;
use crate::pipeline::rag::generator::LlmGenerate;
use crate::pipeline::rag::prompt::build_ticket_messages;
use crate::pipeline::rag::types::ScoredProcedure;

/// Build the plan for one ticket.
///
/// The deterministic template is always rendered. With a generator the
/// text is replaced by its answer; any generator failure keeps the
/// template text, reports `rag-only` and carries the failure as `warn`.
pub fn synthesize(
    fields: &ExtractedFields,
    picked: &[ScoredProcedure],
    augment: Option<&dyn LlmGenerate>,
) -> Plan {
    let base = build_ticket_plan(fields, picked);

    let Some(generator) = augment else {
        return Plan {
            plan_text: base.plan_text,
            recommendations: base.recommendations,
            mode: PlanMode::RagOnly,
            warn: None,
        };
    };

    match generator.generate(&build_ticket_messages(fields, picked)) {
        Ok(text) => Plan {
            plan_text: text,
            recommendations: base.recommendations,
            mode: PlanMode::AiRag,
            warn: None,
        },
        Err(e) => {
            tracing::warn!(model = generator.model(), error = %e, "Plan augmentation failed, using template");
            Plan {
                plan_text: base.plan_text,
                recommendations: base.recommendations,
                mode: PlanMode::RagOnly,
                warn: Some(e.to_string()),
            }
        }
    }
}
