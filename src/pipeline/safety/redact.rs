use std::sync::LazyLock;

use regex::Regex;

pub const PHONE_PLACEHOLDER: &str = "[REDACTED_PHONE]";
pub const IP_PLACEHOLDER: &str = "[REDACTED_IP]";
pub const EMAIL_PLACEHOLDER: &str = "[REDACTED_EMAIL]";

/// Phone shape: optional 1-2 digit country code, 3-3-4 digit groups with
/// optional `-`, `.` or space separators and optional parentheses.
///
/// The leading group keeps the character before the number so a digit run
/// glued to a letter (itinerary codes such as `H123456789012`) never matches.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\W)(?:\+?\d{1,2}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
});

static IP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").unwrap()
});

/// Replace phone numbers, IPv4 literals and email addresses with fixed
/// placeholder tokens.
///
/// Emails go first: a digit run inside a local part must not be taken as a
/// phone number, or the rest of the address would survive.
///
/// Idempotent: placeholders contain no digits and no `@`, so a second pass
/// finds nothing new.
pub fn redact_pii(text: &str) -> String {
    let text = EMAIL_PATTERN.replace_all(text, EMAIL_PLACEHOLDER);
    let text = PHONE_PATTERN.replace_all(&text, format!("${{1}}{PHONE_PLACEHOLDER}"));
    let text = IP_PATTERN.replace_all(&text, IP_PLACEHOLDER);
    text.into_owned()
}

/// Normalise a pasted ticket dump: drop control characters other than
/// newline and tab (this includes `\r` from Windows line endings), then trim.
pub fn normalize_ticket_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// True when `text` still contains a substring of any PII shape.
pub fn contains_pii(text: &str) -> bool {
    PHONE_PATTERN.is_match(text) || IP_PATTERN.is_match(text) || EMAIL_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // =================================================================
    // PHONE
    // =================================================================

    #[test]
    fn redacts_phone_with_country_code() {
        let out = redact_pii("Guest called from +1 555-123-4567 yesterday");
        assert_eq!(out, "Guest called from [REDACTED_PHONE] yesterday");
    }

    #[test]
    fn redacts_parenthesised_phone() {
        let out = redact_pii("Callback: (555) 123-4567");
        assert_eq!(out, "Callback: [REDACTED_PHONE]");
    }

    #[test]
    fn redacts_phone_at_start_of_text() {
        assert_eq!(redact_pii("5551234567 is the number"), "[REDACTED_PHONE] is the number");
    }

    #[test]
    fn keeps_itinerary_codes() {
        let out = redact_pii("Itinerary # H1234567 and H123456789012");
        assert!(out.contains("H1234567"));
        assert!(out.contains("H123456789012"));
    }

    // =================================================================
    // IP + EMAIL
    // =================================================================

    #[test]
    fn redacts_ipv4() {
        assert_eq!(redact_pii("Client IP 192.168.10.4 logged"), "Client IP [REDACTED_IP] logged");
    }

    #[test]
    fn redacts_email_case_insensitive() {
        let out = redact_pii("Reply to John.Smith@Example.COM please");
        assert_eq!(out, "Reply to [REDACTED_EMAIL] please");
    }

    #[test]
    fn email_with_digit_run_redacted_whole() {
        let out = redact_pii("Reply to maria.5551234567@gmail.com today");
        assert_eq!(out, "Reply to [REDACTED_EMAIL] today");
        assert!(!out.contains("gmail"));
    }

    #[test]
    fn redacts_all_three_kinds() {
        let input = "Email jane@mail.com, phone 1-555-123-4567, ip 10.0.0.1";
        let out = redact_pii(input);
        assert_eq!(
            out,
            "Email [REDACTED_EMAIL], phone [REDACTED_PHONE], ip [REDACTED_IP]"
        );
        assert!(!contains_pii(&out));
    }

    // =================================================================
    // EDGE CASES
    // =================================================================

    #[test]
    fn empty_input_is_fine() {
        assert_eq!(redact_pii(""), "");
    }

    #[test]
    fn plain_text_unchanged() {
        let text = "Guest wants to cancel due to flight change";
        assert_eq!(redact_pii(text), text);
    }

    #[test]
    fn normalize_strips_carriage_returns_and_trims() {
        assert_eq!(normalize_ticket_text("  Subject x\r\nReason y\r\n  "), "Subject x\nReason y");
    }

    #[test]
    fn normalize_keeps_tabs() {
        assert_eq!(normalize_ticket_text("a\tb"), "a\tb");
    }

    fn ticket_fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Guest".to_string()),
            Just("Itinerary # H1234567".to_string()),
            Just("(H7654321)".to_string()),
            Just("refund,".to_string()),
            "[a-z]{1,8}",
            "\\+?1[- ]?[0-9]{3}-[0-9]{3}-[0-9]{4}",
            "\\([0-9]{3}\\) [0-9]{3}-[0-9]{4}",
            "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
            "[a-z]{1,6}\\.[a-z]{1,6}@[a-z]{2,6}\\.(com|net|org)",
            "[a-z]{1,6}\\.[0-9]{10}@[a-z]{2,6}\\.(com|net|org)",
        ]
    }

    proptest! {
        #[test]
        fn redaction_is_idempotent(parts in prop::collection::vec(ticket_fragment(), 0..12)) {
            let text = parts.join(" ");
            let once = redact_pii(&text);
            prop_assert_eq!(redact_pii(&once), once.clone());
            prop_assert!(!contains_pii(&once));
        }
    }
}
