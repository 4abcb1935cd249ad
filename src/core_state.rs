//! Shared application state.
//!
//! `CoreState` is built once at startup and shared behind an `Arc` by every
//! request handler. The only mutable part is the procedure corpus, held as
//! `RwLock<Arc<ProcedureCorpus>>`: readers clone the `Arc` and release the
//! lock at once, reload builds the new corpus outside the lock and swaps
//! the reference in a single write.

use std::sync::{Arc, RwLock};

use crate::config::AppConfig;
use crate::pipeline::plan::{AskAnswer, TicketAssistOutcome, TicketAssistPipeline};
use crate::pipeline::rag::corpus::ProcedureCorpus;
use crate::pipeline::rag::generator::{ChatCompletionsClient, LlmGenerate};
use crate::pipeline::rag::loader::{CorpusLoader, CsvDirectoryLoader};
use crate::pipeline::rag::{CorpusError, GenerationError};
use crate::ticket_log::{TicketLogSink, WebhookTicketLog};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    config: AppConfig,
    corpus: RwLock<Arc<ProcedureCorpus>>,
    loader: Box<dyn CorpusLoader>,
    generator: Option<Arc<dyn LlmGenerate>>,
    ticket_log: Option<Arc<dyn TicketLogSink>>,
}

impl CoreState {
    /// Wire production collaborators from configuration and load the corpus.
    pub fn from_config(config: AppConfig) -> Self {
        let loader = Box::new(CsvDirectoryLoader::new(
            config.corpus_dir.clone(),
            config.sheets.clone(),
        ));
        let generator = config
            .generator
            .clone()
            .map(|c| Arc::new(ChatCompletionsClient::new(c)) as Arc<dyn LlmGenerate>);
        let ticket_log = config
            .ticket_log
            .clone()
            .map(|c| Arc::new(WebhookTicketLog::new(c)) as Arc<dyn TicketLogSink>);

        match &generator {
            Some(g) => tracing::info!(model = g.model(), "Text generation enabled"),
            None => tracing::info!("Text generation disabled (no API key)"),
        }
        if ticket_log.is_none() {
            tracing::info!("Ticket logging disabled (no webhook URL)");
        }

        Self::with_parts(config, loader, generator, ticket_log)
    }

    /// Assemble from explicit collaborators. A failing initial load leaves
    /// an empty corpus in service; `reload_corpus` can recover later.
    pub fn with_parts(
        config: AppConfig,
        loader: Box<dyn CorpusLoader>,
        generator: Option<Arc<dyn LlmGenerate>>,
        ticket_log: Option<Arc<dyn TicketLogSink>>,
    ) -> Self {
        let corpus = match loader.load() {
            Ok(documents) => ProcedureCorpus::from_documents(documents),
            Err(e) => {
                tracing::error!(source = %loader.describe(), error = %e, "Initial corpus load failed");
                ProcedureCorpus::default()
            }
        };

        Self {
            config,
            corpus: RwLock::new(Arc::new(corpus)),
            loader,
            generator,
            ticket_log,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ── Corpus ──────────────────────────────────────────────

    /// Snapshot of the corpus in service. Stays valid across reloads.
    pub fn corpus(&self) -> Result<Arc<ProcedureCorpus>, CoreError> {
        let guard = self.corpus.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(Arc::clone(&guard))
    }

    /// Reload from the loader and swap atomically. On failure the previous
    /// corpus stays in place. Returns the new document count.
    pub fn reload_corpus(&self) -> Result<usize, CoreError> {
        let corpus = ProcedureCorpus::from_documents(self.loader.load()?);
        let count = corpus.len();

        let mut guard = self.corpus.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = Arc::new(corpus);
        drop(guard);

        tracing::info!(count, "Procedure corpus reloaded");
        Ok(count)
    }

    pub fn corpus_source(&self) -> String {
        self.loader.describe()
    }

    // ── Collaborators ───────────────────────────────────────

    pub fn generator(&self) -> Option<&dyn LlmGenerate> {
        self.generator.as_deref()
    }

    pub fn ticket_log(&self) -> Option<&dyn TicketLogSink> {
        self.ticket_log.as_deref()
    }

    // ── Operations ──────────────────────────────────────────

    /// Ticket assist against the current corpus snapshot. Blocking when
    /// augmentation is requested.
    pub fn ticket_assist(&self, raw_ticket_text: &str, use_ai: bool) -> Result<TicketAssistOutcome, CoreError> {
        let corpus = self.corpus()?;
        let pipeline = TicketAssistPipeline::new(&corpus, self.generator(), &self.config.retrieval);
        Ok(pipeline.run(raw_ticket_text, use_ai))
    }

    /// Procedure question against the current corpus snapshot. Blocking.
    pub fn ask(&self, scenario: &str, question: &str) -> Result<AskAnswer, CoreError> {
        let corpus = self.corpus()?;
        let pipeline = TicketAssistPipeline::new(&corpus, self.generator(), &self.config.retrieval);
        Ok(pipeline.ask(scenario, question)?)
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Corpus load failed: {0}")]
    Corpus(#[from] CorpusError),
    #[error("{0}")]
    Generation(#[from] GenerationError),
}
