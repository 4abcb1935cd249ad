//! Lexical retrieval over the procedure corpus.
//!
//! Score = sum over shared tokens of `sqrt(query_tf) * sqrt(doc_tf)`, so a
//! document sharing many distinct query terms beats one repeating a single
//! term. An optional exact-phrase bonus is added on top of a non-zero score.

use std::collections::HashMap;

use super::corpus::ProcedureCorpus;
use super::types::{ProcedureDocument, RetrievalResult, ScoredProcedure};

pub const DEFAULT_TOP_K: usize = 6;
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// Added when the whole lowercased query appears verbatim in the document.
pub const EXACT_PHRASE_BONUS: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub min_token_len: usize,
    /// `None` disables the exact-phrase bonus.
    pub phrase_bonus: Option<f64>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            phrase_bonus: Some(EXACT_PHRASE_BONUS),
        }
    }
}

/// Lowercase, turn every character outside `[a-z0-9\s]` into a space,
/// split on whitespace, drop tokens shorter than `min_len`.
pub fn tokenize(text: &str, min_len: usize) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| t.len() >= min_len)
        .map(str::to_string)
        .collect()
}

fn term_frequencies(tokens: &[String]) -> HashMap<&str, usize> {
    let mut tf = HashMap::new();
    for token in tokens {
        *tf.entry(token.as_str()).or_insert(0) += 1;
    }
    tf
}

/// Square-root term-frequency dot product between two token lists.
pub fn score_tokens(query_tokens: &[String], doc_tokens: &[String]) -> f64 {
    if query_tokens.is_empty() || doc_tokens.is_empty() {
        return 0.0;
    }

    let doc_tf = term_frequencies(doc_tokens);
    term_frequencies(query_tokens)
        .into_iter()
        .filter_map(|(term, qtf)| {
            doc_tf
                .get(term)
                .map(|&dtf| (qtf as f64).sqrt() * (dtf as f64).sqrt())
        })
        .sum()
}

fn score_document(
    doc: &ProcedureDocument,
    query_tokens: &[String],
    phrase: &str,
    options: &RetrievalOptions,
) -> f64 {
    let text = doc.searchable_text();
    let score = score_tokens(query_tokens, &tokenize(&text, options.min_token_len));

    match options.phrase_bonus {
        Some(bonus) if score > 0.0 && !phrase.is_empty() && text.to_lowercase().contains(phrase) => {
            score + bonus
        }
        _ => score,
    }
}

/// Rank the corpus against `query` and keep the best `top_k`.
///
/// Zero-score documents are dropped; ties keep corpus order.
pub fn search(corpus: &ProcedureCorpus, query: &str, options: &RetrievalOptions) -> RetrievalResult {
    let query_tokens = tokenize(query, options.min_token_len);
    if query_tokens.is_empty() || options.top_k == 0 {
        return RetrievalResult::empty(query);
    }

    let phrase = query.trim().to_lowercase();

    let mut scored: Vec<ScoredProcedure> = corpus
        .documents()
        .iter()
        .filter_map(|doc| {
            let score = score_document(doc, &query_tokens, &phrase, options);
            (score > 0.0).then(|| ScoredProcedure::new(doc, score))
        })
        .collect();

    // Stable: equal scores keep corpus order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(options.top_k);

    RetrievalResult {
        query: query.to_string(),
        picked: scored,
    }
}
