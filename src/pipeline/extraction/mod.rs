//! Best-effort field extraction from a redacted ticket dump.
//!
//! Pattern matching only: a field that no rule matches keeps its empty
//! default. Nothing in this module returns an error.

pub mod fields;
pub mod flags;
pub mod rules;

pub use fields::{extract_fields, ExtractedFields};
pub use rules::{ExtractionRule, RuleMatch};
