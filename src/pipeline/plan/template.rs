//! Deterministic ticket plan. Always computed: it is the baseline answer and
//! the fallback whenever augmentation is off or fails.

use super::types::{DeterministicPlan, Recommendations};
use crate::pipeline::extraction::ExtractedFields;
use crate::pipeline::rag::types::ScoredProcedure;

pub const MISSING_ITINERARY: &str = "[MISSING_ITINERARY]";
pub const MISSING_GUEST: &str = "[MISSING_GUEST]";
pub const MISSING_REASON: &str = "[MISSING_REASON]";

/// Snippets cited at the end of the plan.
pub const MAX_CITED_SNIPPETS: usize = 6;

const CONTACT_REFUND_PROTECTION: &str =
    "Refund Protection / RP (guide guest to claim + confirm status if you have access)";
const CONTACT_HOTEL: &str =
    "Hotel Front Desk / Manager (courtesy waiver request if policy allows; document name/time/outcome)";
const CONTACT_ESCALATIONS: &str =
    "Internal Escalations / Supervisor (only if matrix requires escalation or guest threatens legal)";

pub const MACRO_RPP_CLAIM: &str = "Refund Protection Claim";
pub const MACRO_NO_REFUND: &str = "Cancellation Policy / No Refund Approved (if applicable)";
pub const MACRO_FOLLOW_UP: &str = "Delay / Follow-up (if awaiting partner/hotel response)";

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn header(fields: &ExtractedFields) -> String {
    let guest = if fields.guest_name.is_empty() {
        or_placeholder(&fields.requester, MISSING_GUEST)
    } else {
        &fields.guest_name
    };

    let cancellations = if fields.cancellation_numbers.is_empty() {
        "none found".to_string()
    } else {
        fields.cancellation_numbers.join(", ")
    };

    [
        "Ticket Summary".to_string(),
        format!("- Itinerary: {}", or_placeholder(&fields.itinerary, MISSING_ITINERARY)),
        format!("- Guest: {guest}"),
        format!("- Reason: {}", or_placeholder(&fields.reason, MISSING_REASON)),
        format!("- RPP: {}", if fields.has_rpp { "YES" } else { "NO/UNKNOWN" }),
        format!(
            "- RP Status: {}",
            if fields.rp_denied { "DENIED (per notes)" } else { "UNKNOWN" }
        ),
        format!("- Cancellation #s: {cancellations}"),
        format!(
            "- Hotel contact attempts: {}",
            if fields.hotel_contacted { "YES" } else { "NO/UNKNOWN" }
        ),
        format!(
            "- Hotel answered: {}",
            if fields.hotel_no_answer { "NO (per notes)" } else { "UNKNOWN" }
        ),
    ]
    .join("\n")
}

/// Ordered outbound contacts. Refund Protection leads only when the booking
/// carries RPP; the hotel is always listed; escalations always come last.
pub fn who_to_call(fields: &ExtractedFields) -> Vec<String> {
    let mut contacts = Vec::with_capacity(3);
    if fields.has_rpp {
        contacts.push(CONTACT_REFUND_PROTECTION);
    }
    contacts.push(CONTACT_HOTEL);
    contacts.push(CONTACT_ESCALATIONS);

    contacts
        .into_iter()
        .enumerate()
        .map(|(i, contact)| format!("{}) {contact}", i + 1))
        .collect()
}

fn path_lines(fields: &ExtractedFields) -> [&'static str; 2] {
    let coverage = if fields.has_rpp {
        "- This itinerary includes RPP → do NOT promise refund/cancellation. Direct guest to submit/continue the RPP claim (Requestmyrefund.com) and document it."
    } else {
        "- If no RPP → follow hotel cancellation policy window + penalties; attempt courtesy waiver only when allowed; never promise refund."
    };
    let status = if fields.rp_denied {
        "- RP already denied per ticket → communicate denial clearly and professionally, and offer to re-check with the property only if there is a named approval contact."
    } else {
        "- If RP status unknown → ask: “Have you submitted the claim already? Any claim/denial email? If yes, request the claim reference and proceed accordingly.”"
    };
    [coverage, status]
}

fn guest_communication_lines(fields: &ExtractedFields) -> [&'static str; 2] {
    let opening = if fields.has_rpp {
        "- “This reservation includes a Refund Protection Plan. Please submit or continue your refund request at Requestmyrefund.com. Once the claim is reviewed, you’ll receive a decision by email. If you already submitted, please share the claim reference so I can note it on the ticket.”"
    } else {
        "- “I can review your cancellation options, but I can’t guarantee a refund until we verify the hotel’s policy. May I confirm your itinerary number, hotel, and dates?”"
    };
    let follow_up = if fields.guest_asks_status {
        "- Status update reply: “Thanks for checking in. Your request is still under review based on policy/partner decision. If you have any denial/approval email or a reference number, please share it so we can update the ticket notes.”"
    } else {
        "- If guest is requesting cancel: confirm details → share available options → document."
    };
    [opening, follow_up]
}

fn steps(fields: &ExtractedFields) -> String {
    let mut lines: Vec<String> = vec![
        "Step-by-step (organized)".into(),
        String::new(),
        "A) Verify required identifiers (DO THIS FIRST)".into(),
        "- Confirm itinerary number, guest full name, hotel name, check-in/check-out dates.".into(),
        "- Confirm email on file is correct.".into(),
        String::new(),
        "B) Determine the correct path".into(),
    ];
    lines.extend(path_lines(fields).iter().map(|s| s.to_string()));

    lines.push(String::new());
    lines.push("C) Outbound attempts (Who to call first)".into());
    lines.extend(who_to_call(fields).into_iter().map(|c| format!("- {c}")));

    lines.push(String::new());
    lines.push("D) Guest communication (macro-ready wording)".into());
    lines.extend(guest_communication_lines(fields).iter().map(|s| s.to_string()));

    lines.extend(
        [
            "",
            "E) Documentation (internal note checklist)",
            "- Ticket concern + reason (flight altered / court date changed, etc.)",
            "- All call attempts (numbers dialed, times, who you spoke with)",
            "- Policy outcome (RPP path / denial / hotel decision)",
            "- What you sent to guest (macro used + links)",
            "- Next step owner + follow-up date/time if applicable",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    lines.join("\n")
}

/// Citation block, or `None` when nothing was retrieved so no empty
/// heading is emitted.
fn snippet_section(picked: &[ScoredProcedure]) -> Option<String> {
    if picked.is_empty() {
        return None;
    }
    let mut lines = vec!["Procedure snippets used (from matrix)".to_string()];
    lines.extend(
        picked
            .iter()
            .take(MAX_CITED_SNIPPETS)
            .enumerate()
            .map(|(i, p)| format!("- {}. [{}] {} (score {:.2})", i + 1, p.sheet, p.title, p.score)),
    );
    Some(lines.join("\n"))
}

pub fn recommend(fields: &ExtractedFields) -> Recommendations {
    let macro_for_path = if fields.has_rpp {
        MACRO_RPP_CLAIM
    } else {
        MACRO_NO_REFUND
    };

    let tags = [
        Some("refund_request"),
        Some(if fields.has_rpp { "rpp" } else { "no_rpp" }),
        fields.rp_denied.then_some("rp_denied"),
        fields.guest_asks_status.then_some("status_update"),
    ];

    Recommendations {
        suggested_macros: vec![macro_for_path.to_string(), MACRO_FOLLOW_UP.to_string()],
        suggested_tags: tags.into_iter().flatten().map(str::to_string).collect(),
    }
}

/// Render the full deterministic plan.
pub fn build_ticket_plan(fields: &ExtractedFields, picked: &[ScoredProcedure]) -> DeterministicPlan {
    let mut plan_text = format!("{}\n\n{}", header(fields), steps(fields));
    if let Some(section) = snippet_section(picked) {
        plan_text.push_str("\n\n");
        plan_text.push_str(&section);
    }

    DeterministicPlan {
        plan_text,
        recommendations: recommend(fields),
    }
}
