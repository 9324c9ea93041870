//! Request facade: the single entry point used by the host application.
//!
//! [`ContextEngine`] owns the summary history and borrows documents through
//! a [`DocumentCorpus`]. Every operation is synchronous and returns either a
//! complete value or a [`ContextError`]; nothing here performs network I/O.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`get_context_for_translation`](ContextEngine::get_context_for_translation) | Bundle for a translate-with-context request |
//! | [`get_context_for_summary`](ContextEngine::get_context_for_summary) | Bundle for a summary request |
//! | [`record_summary`](ContextEngine::record_summary) | Append to history, returning any evicted entry |
//! | [`history`](ContextEngine::history) | Current history, oldest insertion first |
//! | [`clear_history`](ContextEngine::clear_history) | Explicit reset |
//! | [`estimate`](ContextEngine::estimate) | Size of all available context |
//! | [`preview`](ContextEngine::preview) | Limited bundle plus size estimate |
//! | [`validate`](ContextEngine::validate) | Per-document usability check |

use serde::Serialize;
use tracing::info;

use crate::corpus::DocumentCorpus;
use crate::error::ContextResult;
use crate::history::HistoryStore;
use crate::inspect::{estimate_context, validate_documents, ContextEstimate, DocumentCheck};
use crate::models::{ContextBundle, SummaryEntry};
use crate::request::ContextRequestSpec;
use crate::select::select_context;

/// A truncated bundle together with the size of everything available.
#[derive(Debug, Clone, Serialize)]
pub struct ContextPreview {
    /// The request as previewed, before the limit was applied.
    pub spec: ContextRequestSpec,
    pub bundle: ContextBundle,
    pub estimate: ContextEstimate,
}

pub struct ContextEngine<C: DocumentCorpus> {
    corpus: C,
    history: HistoryStore,
}

impl<C: DocumentCorpus> ContextEngine<C> {
    pub fn new(corpus: C) -> Self {
        Self::with_history(corpus, HistoryStore::new())
    }

    /// Build an engine around an existing (e.g. hydrated) history store.
    pub fn with_history(corpus: C, history: HistoryStore) -> Self {
        Self { corpus, history }
    }

    pub fn corpus(&self) -> &C {
        &self.corpus
    }

    pub fn get_context_for_translation(
        &self,
        spec: &ContextRequestSpec,
    ) -> ContextResult<ContextBundle> {
        let bundle = select_context(&self.corpus, spec)?;
        info!(
            chunks = bundle.chunks.len(),
            pairs = bundle.total_pairs,
            "prepared translation context"
        );
        Ok(bundle)
    }

    pub fn get_context_for_summary(&self, spec: &ContextRequestSpec) -> ContextResult<ContextBundle> {
        let bundle = select_context(&self.corpus, spec)?;
        info!(
            chunks = bundle.chunks.len(),
            pairs = bundle.total_pairs,
            "prepared summary context"
        );
        Ok(bundle)
    }

    pub fn record_summary(&self, entry: SummaryEntry) -> ContextResult<Option<SummaryEntry>> {
        self.history.append(entry)
    }

    pub fn history(&self) -> Vec<SummaryEntry> {
        self.history.list()
    }

    pub fn history_store(&self) -> &HistoryStore {
        &self.history
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    /// Size of everything `spec` could draw from. Selects nothing.
    pub fn estimate(&self, spec: &ContextRequestSpec) -> ContextResult<ContextEstimate> {
        estimate_context(&self.corpus, spec)
    }

    /// The first `limit` chunks `spec` would select, and the untruncated size.
    pub fn preview(&self, spec: &ContextRequestSpec, limit: usize) -> ContextResult<ContextPreview> {
        let estimate = self.estimate(spec)?;
        let limited = spec
            .clone()
            .with_max_chunks(limit.min(spec.max_chunks));
        let bundle = select_context(&self.corpus, &limited)?;
        Ok(ContextPreview {
            spec: spec.clone(),
            bundle,
            estimate,
        })
    }

    pub fn validate(&self, spec: &ContextRequestSpec) -> Vec<DocumentCheck> {
        validate_documents(&self.corpus, spec)
    }
}
