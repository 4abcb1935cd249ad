use serde::{Deserialize, Serialize};

/// One row of the procedure matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureDocument {
    pub id: String,
    pub sheet: String,
    pub title: String,
    #[serde(default)]
    pub tags: String,
    pub body: String,
}

impl ProcedureDocument {
    /// Text the retriever scores: title, tags and body.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.title, self.tags, self.body)
    }
}

/// A procedure with its relevance to one query. Produced per retrieval
/// call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProcedure {
    pub id: String,
    pub sheet: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub score: f64,
}

impl ScoredProcedure {
    pub fn new(doc: &ProcedureDocument, score: f64) -> Self {
        Self {
            id: doc.id.clone(),
            sheet: doc.sheet.clone(),
            title: doc.title.clone(),
            text: doc.body.clone(),
            score,
        }
    }
}

/// Retrieval output handed to the plan and to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query: String,
    pub picked: Vec<ScoredProcedure>,
}

impl RetrievalResult {
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            picked: Vec::new(),
        }
    }
}
