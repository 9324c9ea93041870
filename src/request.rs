//! Per-request context parameters.

use serde::{Deserialize, Serialize};

use crate::chunk::RowFilter;
use crate::error::{ContextError, ContextResult};

pub const DEFAULT_CHUNK_SIZE: usize = 50;
pub const DEFAULT_MAX_CHUNKS: usize = 10;

/// Which documents to draw context from and how to cut it.
///
/// Built per request and never mutated afterwards; the `with_*` methods
/// consume and return the value. [`validate`](Self::validate) is run by the
/// selector before any document is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRequestSpec {
    /// Document handles, in the order their chunks should appear.
    pub documents: Vec<String>,
    pub source_column: String,
    pub translation_column: String,
    /// Qualifying rows per chunk.
    pub chunk_size: usize,
    pub max_chunks: usize,
    pub only_translated_rows: bool,
    /// Raw rows left out of the context, typically the rows being translated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_rows: Option<ExcludedRows>,
}

/// An inclusive range of raw document rows to leave out.
///
/// With `document` set only that document is affected; otherwise the range
/// applies to every requested document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl ExcludedRows {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            document: None,
            start,
            end,
        }
    }

    pub fn in_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn applies_to(&self, handle: &str) -> bool {
        self.document.as_deref().map_or(true, |d| d == handle)
    }
}

impl ContextRequestSpec {
    pub fn new<I, S>(documents: I, source_column: &str, translation_column: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: documents.into_iter().map(Into::into).collect(),
            source_column: source_column.to_string(),
            translation_column: translation_column.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            only_translated_rows: true,
            exclude_rows: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_only_translated_rows(mut self, only_translated_rows: bool) -> Self {
        self.only_translated_rows = only_translated_rows;
        self
    }

    pub fn with_excluded_rows(mut self, exclude_rows: ExcludedRows) -> Self {
        self.exclude_rows = Some(exclude_rows);
        self
    }

    /// Row filter for one of the requested documents.
    pub fn row_filter(&self, handle: &str) -> RowFilter {
        let filter = RowFilter::new(self.only_translated_rows);
        match &self.exclude_rows {
            Some(ex) if ex.applies_to(handle) => filter.excluding(ex.start..=ex.end),
            _ => filter,
        }
    }

    pub fn validate(&self) -> ContextResult<()> {
        if self.chunk_size < 1 {
            return Err(ContextError::invalid("chunk_size must be >= 1"));
        }
        if self.max_chunks < 1 {
            return Err(ContextError::invalid("max_chunks must be >= 1"));
        }
        if let Some(ex) = &self.exclude_rows {
            if ex.start > ex.end {
                return Err(ContextError::invalid(format!(
                    "exclude_rows start {} is after end {}",
                    ex.start, ex.end
                )));
            }
        }
        Ok(())
    }

    /// Handles in listed order with later duplicates dropped.
    pub fn unique_documents(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.documents
            .iter()
            .map(String::as_str)
            .filter(|h| seen.insert(*h))
            .collect()
    }
}
