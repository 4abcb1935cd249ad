pub mod types;
pub mod corpus;
pub mod loader;
pub mod retrieval;
pub mod prompt;
pub mod generator;

use std::path::PathBuf;

use thiserror::Error;

/// Failures while building a procedure corpus. Fatal to a reload call only;
/// the corpus already in service stays in place.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Procedure source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("No matching sheets. Wanted: {wanted} | Available: {available}")]
    NoMatchingSheets { wanted: String, available: String },

    #[error("Malformed sheet {sheet}: {source}")]
    MalformedSheet {
        sheet: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the external text generator. Never fatal to ticket assist:
/// they downgrade the plan to the deterministic template.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Text generation is not configured")]
    NotConfigured,

    #[error("Generator unreachable at {0}")]
    Connection(String),

    #[error("Generator request timed out after {0}s")]
    Timeout(u64),

    #[error("Generator returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generator returned an empty answer")]
    EmptyResponse,
}
