//! Procedure matrix loader.
//!
//! The matrix is a directory of CSV exports, one file per sheet. Column
//! names vary between sheets, so headers are normalised and resolved through
//! an alias map here, before anything reaches the corpus.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::corpus::dedup_key;
use super::types::ProcedureDocument;
use super::CorpusError;

/// Normalised header names that can supply a document title, in priority order.
const TITLE_ALIASES: &[&str] = &[
    "title",
    "guideline",
    "rule",
    "policy",
    "scenario",
    "topic",
    "question",
    "category",
    "issue",
    "step",
    "procedure",
];

const TAG_ALIASES: &[&str] = &["tags", "keywords", "keyword"];

const MAX_TITLE_CHARS: usize = 80;

/// Rows whose rendered body is shorter than this carry no usable procedure.
const MIN_BODY_CHARS: usize = 10;

/// Source of procedure documents. Must be deterministic for identical input.
pub trait CorpusLoader: Send + Sync {
    fn load(&self) -> Result<Vec<ProcedureDocument>, CorpusError>;

    /// Human-readable description of the source, for health output.
    fn describe(&self) -> String;
}

/// Loads every `*.csv` file in a directory; the file stem is the sheet name.
pub struct CsvDirectoryLoader {
    dir: PathBuf,
    sheets: Vec<String>,
}

impl CsvDirectoryLoader {
    /// `sheets` is an allowlist; empty means every sheet.
    pub fn new(dir: impl Into<PathBuf>, sheets: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            sheets,
        }
    }

    /// Available sheets as (name, path), sorted by name.
    fn available_sheets(&self) -> Result<Vec<(String, PathBuf)>, CorpusError> {
        if !self.dir.is_dir() {
            return Err(CorpusError::SourceNotFound(self.dir.clone()));
        }

        let mut sheets = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                sheets.push((stem.to_string(), path.clone()));
            }
        }
        sheets.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sheets)
    }
}

impl CorpusLoader for CsvDirectoryLoader {
    fn load(&self) -> Result<Vec<ProcedureDocument>, CorpusError> {
        let available = self.available_sheets()?;

        let targets: Vec<&(String, PathBuf)> = if self.sheets.is_empty() {
            available.iter().collect()
        } else {
            available
                .iter()
                .filter(|(name, _)| self.sheets.iter().any(|s| s == name))
                .collect()
        };

        if targets.is_empty() {
            return Err(CorpusError::NoMatchingSheets {
                wanted: self.sheets.join(", "),
                available: available
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let mut documents = Vec::new();
        let mut seen = HashSet::new();
        let mut next_id = 1usize;

        for (sheet, path) in targets {
            for doc in read_sheet(sheet, path)? {
                if !seen.insert(dedup_key(&doc)) {
                    continue;
                }
                documents.push(ProcedureDocument {
                    id: format!("P{next_id:05}"),
                    ..doc
                });
                next_id += 1;
            }
        }

        tracing::info!(
            source = %self.dir.display(),
            documents = documents.len(),
            "Procedure matrix loaded"
        );
        Ok(documents)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Read one sheet into documents with empty ids.
fn read_sheet(sheet: &str, path: &Path) -> Result<Vec<ProcedureDocument>, CorpusError> {
    let malformed = |source: csv::Error| CorpusError::MalformedSheet {
        sheet: sheet.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(malformed)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();
    let normalized: Vec<String> = headers.iter().map(|h| normalize_key(h)).collect();

    let title_col = find_column(&normalized, TITLE_ALIASES);
    let tags_col = find_column(&normalized, TAG_ALIASES);

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let body = row_to_text(&headers, &record);
        if body.chars().count() < MIN_BODY_CHARS {
            continue;
        }

        let title = cell(title_col);
        let title = if title.is_empty() {
            format!("{sheet} Row")
        } else {
            title.chars().take(MAX_TITLE_CHARS).collect()
        };

        documents.push(ProcedureDocument {
            id: String::new(),
            sheet: sheet.to_string(),
            title,
            tags: cell(tags_col),
            body,
        });
    }

    Ok(documents)
}

/// Trim, collapse inner whitespace, lowercase.
fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Index of the first header matching an alias, honouring alias priority.
fn find_column(normalized: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| normalized.iter().position(|h| h == alias))
}

/// `Header: value` for every non-empty cell, joined with ` | `.
fn row_to_text(headers: &[String], record: &csv::StringRecord) -> String {
    headers
        .iter()
        .zip(record.iter())
        .filter_map(|(key, value)| {
            let key = key.trim();
            let value = value.trim();
            (!key.is_empty() && !value.is_empty()).then(|| format!("{key}: {value}"))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// In-memory loader for tests. Documents can be swapped between loads;
/// `None` makes the next load fail.
#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use super::*;

    pub struct MemoryLoader {
        documents: Mutex<Option<Vec<ProcedureDocument>>>,
    }

    impl MemoryLoader {
        pub fn new(documents: Vec<ProcedureDocument>) -> Self {
            Self {
                documents: Mutex::new(Some(documents)),
            }
        }

        pub fn set(&self, documents: Option<Vec<ProcedureDocument>>) {
            *self.documents.lock().unwrap() = documents;
        }
    }

    impl CorpusLoader for MemoryLoader {
        fn load(&self) -> Result<Vec<ProcedureDocument>, CorpusError> {
            self.documents
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| CorpusError::NoMatchingSheets {
                    wanted: "Missing".into(),
                    available: String::new(),
                })
        }

        fn describe(&self) -> String {
            "memory".into()
        }
    }

    pub fn doc(id: &str, sheet: &str, title: &str, body: &str) -> ProcedureDocument {
        ProcedureDocument {
            id: id.into(),
            sheet: sheet.into(),
            title: title.into(),
            tags: String::new(),
            body: body.into(),
        }
    }
}
