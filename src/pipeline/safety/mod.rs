pub mod redact;

pub use redact::{contains_pii, normalize_ticket_text, redact_pii};
