//! Boolean ticket flags. Each flag is a fixed list of case-insensitive,
//! word-bounded phrases; any hit anywhere in the text sets it.

use std::sync::LazyLock;

use super::rules::{any_match, ExtractionRule};

static RPP_PHRASES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("plan_name", r"(?i)\bRefund Protection Plan\b"),
        ExtractionRule::new("rpp_acronym", r"(?i)\bRPP\b"),
        ExtractionRule::new("claim_site", r"(?i)\bRequestmyrefund\.com\b"),
    ]
});

static DENIED_WORD: LazyLock<Vec<ExtractionRule>> =
    LazyLock::new(|| vec![ExtractionRule::new("denied", r"(?i)\bdenied\b")]);

static RP_WORD: LazyLock<Vec<ExtractionRule>> =
    LazyLock::new(|| vec![ExtractionRule::new("rp", r"(?i)\bRP\b")]);

static STATUS_REQUEST_PHRASES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("update_me", r"(?i)\bupdate me on the status\b"),
        ExtractionRule::new("refund_status", r"(?i)\bstatus of my refund request\b"),
    ]
});

static HOTEL_CONTACT_PHRASES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("contacted_field", r"(?i)\bContacted Hotel:\s*yes\b"),
        ExtractionRule::new("called_front_desk", r"(?i)\bI called (?:the )?(?:FD|front desk)\b"),
        ExtractionRule::new("called_htl", r"(?i)\bI called HTL\b"),
    ]
});

static NO_ANSWER_PHRASES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    vec![
        ExtractionRule::new("no_answer", r"(?i)\bno answer\b"),
        ExtractionRule::new("no_ans", r"(?i)\bno ans\b"),
    ]
});

pub fn has_rpp(text: &str) -> bool {
    any_match(text, &RPP_PHRASES)
}

/// "denied" anywhere AND "RP" anywhere. The two checks are independent, so
/// unrelated mentions of both words also set the flag.
pub fn rp_denied(text: &str) -> bool {
    any_match(text, &DENIED_WORD) && any_match(text, &RP_WORD)
}

pub fn guest_asks_status(text: &str) -> bool {
    any_match(text, &STATUS_REQUEST_PHRASES)
}

pub fn hotel_contacted(text: &str) -> bool {
    any_match(text, &HOTEL_CONTACT_PHRASES)
}

pub fn hotel_no_answer(text: &str) -> bool {
    any_match(text, &NO_ANSWER_PHRASES)
}
