use std::collections::HashSet;

use super::types::ProcedureDocument;

/// Ordered, deduplicated set of procedure documents.
///
/// Immutable once built; a reload builds a new corpus and swaps the shared
/// reference (see `CoreState::reload_corpus`).
#[derive(Debug, Clone, Default)]
pub struct ProcedureCorpus {
    documents: Vec<ProcedureDocument>,
}

impl ProcedureCorpus {
    /// Build from loader output, dropping later documents whose
    /// (sheet, title, body) triple repeats an earlier one, compared
    /// case-insensitively.
    pub fn from_documents(documents: Vec<ProcedureDocument>) -> Self {
        let before = documents.len();
        let mut seen = HashSet::new();
        let documents: Vec<ProcedureDocument> = documents
            .into_iter()
            .filter(|doc| seen.insert(dedup_key(doc)))
            .collect();

        if documents.len() < before {
            tracing::debug!(
                dropped = before - documents.len(),
                "Duplicate procedures removed from corpus"
            );
        }

        Self { documents }
    }

    pub fn documents(&self) -> &[ProcedureDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Distinct sheet names in first-seen order.
    pub fn sheets(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for doc in &self.documents {
            if !out.contains(&doc.sheet.as_str()) {
                out.push(&doc.sheet);
            }
        }
        out
    }
}

pub(crate) fn dedup_key(doc: &ProcedureDocument) -> String {
    format!("{}::{}::{}", doc.sheet, doc.title, doc.body).to_lowercase()
}
