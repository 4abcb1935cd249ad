use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::flags;
use super::rules::{collect_all, dedup_preserving_order, pick_first, ExtractionRule};

/// Facts pulled from a redacted ticket dump.
///
/// Every field is optional in practice: absence is an empty string, an
/// empty list or `false`, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    pub itinerary: String,
    pub subject: String,
    pub requester: String,
    pub guest_name: String,
    pub reason: String,
    pub actions_taken: String,
    pub resolution: String,
    #[serde(rename = "hasRPP")]
    pub has_rpp: bool,
    pub rp_denied: bool,
    pub guest_asks_status: bool,
    pub hotel_contacted: bool,
    pub hotel_no_answer: bool,
    pub cancellation_numbers: Vec<String>,
    pub macros: Vec<String>,
    pub tags: Vec<String>,
    pub redacted_text: String,
}

// ═══════════════════════════════════════════════════════════
// Cascades (most specific first)
// ═══════════════════════════════════════════════════════════

pub static ITINERARY_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new(
            "confirmation_label",
            r"(?i)\bItinerary/Confirmation Number\s+([A-Z]\d{6,})\b",
        ),
        ExtractionRule::new("itinerary_hash", r"(?i)\bItinerary\s*#\s*([A-Z]\d{6,})\b"),
        ExtractionRule::new("parenthesised", r"\(([A-Z]\d{6,})\)"),
        ExtractionRule::new("bare_code", r"\b([A-Z]\d{6,})\b"),
    ]
});

pub static SUBJECT_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("subject_line", r"(?im)^Subject[ \t]*:?[ \t]+(.+)$"),
        ExtractionRule::new("client_line", r"(?im)^Client.*$"),
    ]
});

pub static REQUESTER_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("requester_line", r"(?im)^Requester[ \t]*:?[ \t]+(.+)$"),
        ExtractionRule::new("name_line", r"(?im)^Name:[ \t]*([A-Z][A-Z \t.'-]{2,})$"),
    ]
});

pub static GUEST_NAME_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("name_line", r"(?im)^Name:[ \t]*([A-Z][A-Z \t.'-]{2,})$"),
        ExtractionRule::new("dear_greeting", r"(?i)\bDear[ \t]+([A-Z][A-Z \t.'-]{2,})\b"),
    ]
});

pub static REASON_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("reason_for_call", r"(?im)^Reason for Call:[ \t]*(.+)$"),
        ExtractionRule::new("gst_requesting", r"(?im)^GST is requesting.*?:[ \t]*(.+)$"),
        ExtractionRule::new(
            "requesting_cancel_because",
            r"(?im)\brequesting to (?:cancel|cxl).+?\b(?:due to|because)\b(.+)$",
        ),
    ]
});

pub static ACTIONS_TAKEN_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![ExtractionRule::new("actions_taken_line", r"(?im)^Actions taken:[ \t]*(.+)$")]
});

pub static RESOLUTION_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![ExtractionRule::new("resolution_line", r"(?im)^Resolution:[ \t]*(.+)$")]
});

// ═══════════════════════════════════════════════════════════
// Collectors (every match)
// ═══════════════════════════════════════════════════════════

pub static CANCELLATION_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("spaced_label", r"(?i)\bCancellation number\s+([A-Z0-9]{6,})\b"),
        ExtractionRule::new(
            "punctuated_label",
            r"(?i)\bCancellation number\s*[:#]?\s*([A-Z0-9]{6,})\b",
        ),
    ]
});

pub static MACRO_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![ExtractionRule::new("macro_applied_line", r"(?im)^Macro applied[ \t]*:?[ \t]+(.+)$")]
});

pub static TAG_LINE_RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![ExtractionRule::new("tags_line", r"(?im)^Tags[ \t]*:?[ \t]+(.+)$")]
});

// ═══════════════════════════════════════════════════════════
// Extraction
// ═══════════════════════════════════════════════════════════

/// Derive the structured fact set from already-redacted ticket text.
pub fn extract_fields(redacted_text: &str) -> ExtractedFields {
    let text = redacted_text;

    let requester = pick_first(text, &REQUESTER_RULES);
    let guest_name = pick_first(text, &GUEST_NAME_RULES);

    // Each name fills in for the other when only one was found.
    let (requester, guest_name) = match (requester.is_empty(), guest_name.is_empty()) {
        (true, false) => (guest_name.clone(), guest_name),
        (false, true) => (requester.clone(), requester),
        _ => (requester, guest_name),
    };

    ExtractedFields {
        itinerary: pick_first(text, &ITINERARY_RULES),
        subject: pick_first(text, &SUBJECT_RULES),
        requester,
        guest_name,
        reason: pick_first(text, &REASON_RULES),
        actions_taken: pick_first(text, &ACTIONS_TAKEN_RULES),
        resolution: pick_first(text, &RESOLUTION_RULES),
        has_rpp: flags::has_rpp(text),
        rp_denied: flags::rp_denied(text),
        guest_asks_status: flags::guest_asks_status(text),
        hotel_contacted: flags::hotel_contacted(text),
        hotel_no_answer: flags::hotel_no_answer(text),
        cancellation_numbers: collect_all(text, &CANCELLATION_RULES),
        macros: collect_all(text, &MACRO_RULES),
        tags: split_tags(&collect_all(text, &TAG_LINE_RULES)),
        redacted_text: text.to_string(),
    }
}

/// Split tag lines on commas and whitespace, dropping repeats.
fn split_tags(lines: &[String]) -> Vec<String> {
    dedup_preserving_order(
        lines
            .iter()
            .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    )
}
