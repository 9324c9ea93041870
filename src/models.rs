//! Core data models used throughout rowctx.
//!
//! These types represent the documents being read, the chunks and bundles
//! assembled from them, and the summary entries kept in history. Everything
//! here except the history store's internal list is immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::request::ContextRequestSpec;

/// One record of a document projected onto a source/translation column pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub source_text: String,
    pub translated_text: Option<String>,
}

impl Row {
    /// True when the translation cell is present and not blank.
    pub fn is_translated(&self) -> bool {
        self.translated_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// A single cell value. `None` is an absent cell.
pub type Cell = Option<String>;

/// An ordered collection of column-named records, identified by a handle.
///
/// Documents are owned by the corpus; the engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub handle: String,
    pub columns: Vec<String>,
    pub records: Vec<Vec<Cell>>,
}

impl Document {
    pub fn new(handle: impl Into<String>, columns: Vec<String>, records: Vec<Vec<Cell>>) -> Self {
        Self {
            handle: handle.into(),
            columns,
            records,
        }
    }

    /// Build a two-column document from `(source, translation)` pairs.
    /// An empty translation string is kept as an empty (not absent) cell.
    pub fn from_pairs(
        handle: impl Into<String>,
        source_column: &str,
        translation_column: &str,
        pairs: &[(&str, &str)],
    ) -> Self {
        let records = pairs
            .iter()
            .map(|(s, t)| vec![Some(s.to_string()), Some(t.to_string())])
            .collect();
        Self::new(
            handle,
            vec![source_column.to_string(), translation_column.to_string()],
            records,
        )
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_columns(&self, source_column: &str, translation_column: &str) -> bool {
        self.column_index(source_column).is_some() && self.column_index(translation_column).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Project every record onto the given columns, in document order.
    ///
    /// Yields nothing when either column is missing. An absent source cell
    /// becomes an empty string.
    pub fn rows<'a>(
        &'a self,
        source_column: &str,
        translation_column: &str,
    ) -> impl Iterator<Item = Row> + 'a {
        let columns = self
            .column_index(source_column)
            .zip(self.column_index(translation_column));

        columns.into_iter().flat_map(move |(src, tr)| {
            self.records.iter().map(move |record| Row {
                source_text: record.get(src).cloned().flatten().unwrap_or_default(),
                translated_text: record.get(tr).cloned().flatten(),
            })
        })
    }
}

/// A `(source, translation)` text pair inside a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationPair {
    pub source: String,
    pub translation: String,
}

/// A bounded group of consecutive qualifying rows from one document.
///
/// `start_index` and `end_index` are inclusive positions in the qualifying
/// (post-filter) row sequence, so `end_index - start_index + 1 == pairs.len()`.
/// `source_rows` holds the raw document row position of each pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub document: String,
    pub start_index: usize,
    pub end_index: usize,
    pub pairs: Vec<TranslationPair>,
    pub source_rows: Vec<usize>,
    /// SHA-256 of the pair texts.
    pub hash: String,
}

impl ContextChunk {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The ordered, size-capped set of chunks handed to a generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub chunks: Vec<ContextChunk>,
    pub total_pairs: usize,
}

impl ContextBundle {
    pub fn from_chunks(chunks: Vec<ContextChunk>) -> Self {
        let total_pairs = chunks.iter().map(ContextChunk::len).sum();
        Self {
            chunks,
            total_pairs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// A generated summary, recorded once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub model_name: String,
    pub token_count: u64,
    pub content: String,
    #[serde(default)]
    pub source_context_spec: Option<ContextRequestSpec>,
    /// The instruction the summary was generated with, if the caller kept it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl SummaryEntry {
    /// Create an entry stamped with a fresh UUID and the current time.
    pub fn new(model_name: impl Into<String>, content: impl Into<String>, token_count: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            model_name: model_name.into(),
            token_count,
            content: content.into(),
            source_context_spec: None,
            instruction: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_context_spec(mut self, spec: ContextRequestSpec) -> Self {
        self.source_context_spec = Some(spec);
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }
}
