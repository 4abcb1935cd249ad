use serde::{Deserialize, Serialize};

use super::types::ScoredProcedure;
use crate::pipeline::extraction::ExtractedFields;

/// Snippets included in a generator prompt.
pub const MAX_PROMPT_SNIPPETS: usize = 8;

/// Longer snippet bodies are cut and marked with an ellipsis.
pub const MAX_SNIPPET_CHARS: usize = 1200;

pub const TICKET_SYSTEM_PROMPT: &str = r#"You are a hotel-booking support Ticket Specialist. Follow internal procedures. Be policy-safe: never promise refunds or cancellations. Output MUST be organized:
- Summary
- Who to call first (ordered)
- Step-by-step actions
- What to say to guest (copy-paste)
- What to document
Use provided procedure snippets if present; if missing, ask for required info."#;

pub const ASK_SYSTEM_PROMPT: &str = "You are a hotel-booking procedure assistant. Follow the internal matrix. Never promise refunds or cancellations. If info is missing, ask for it. Output must be clear and compliant.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// Role-tagged message for the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// `SNIPPET [sheet] title` blocks, blank-line separated; `None` when there
/// is nothing to show.
pub fn format_snippets(picked: &[ScoredProcedure]) -> Option<String> {
    if picked.is_empty() {
        return None;
    }
    let blocks: Vec<String> = picked
        .iter()
        .take(MAX_PROMPT_SNIPPETS)
        .map(|p| format!("SNIPPET [{}] {}\n{}", p.sheet, p.title, clip(&p.text, MAX_SNIPPET_CHARS)))
        .collect();
    Some(blocks.join("\n\n"))
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Messages asking the generator to rewrite the ticket plan.
pub fn build_ticket_messages(fields: &ExtractedFields, picked: &[ScoredProcedure]) -> Vec<ChatMessage> {
    let parsed = serde_json::to_string_pretty(fields).unwrap_or_else(|_| "{}".to_string());
    let snippets = format_snippets(picked).unwrap_or_else(|| "(none)".to_string());

    let user = format!(
        "Ticket dump (redacted):\n{}\n\nParsed JSON:\n{}\n\nProcedure snippets:\n{}",
        fields.redacted_text, parsed, snippets
    );

    vec![ChatMessage::system(TICKET_SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Messages for a free-form procedure question.
pub fn build_ask_messages(scenario: &str, question: &str, picked: &[ScoredProcedure]) -> Vec<ChatMessage> {
    let snippets = format_snippets(picked).unwrap_or_else(|| "(none matched)".to_string());
    let user = format!(
        "Scenario:\n{scenario}\n\nQuestion:\n{question}\n\nProcedure snippets:\n{snippets}"
    );
    vec![ChatMessage::system(ASK_SYSTEM_PROMPT), ChatMessage::user(user)]
}
