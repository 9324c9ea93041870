//! Row-count chunker.
//!
//! Splits a document's rows into [`ContextChunk`]s of exactly `chunk_size`
//! `(source, translation)` pairs, with a shorter final chunk when the row
//! count does not divide evenly.
//!
//! # Algorithm
//!
//! 1. Project each record onto the source/translation column pair.
//! 2. Drop rows in the excluded raw range, if any, then (when
//!    `only_translated_rows` is set) rows whose translation is absent or
//!    blank. Dropped rows do not count toward chunk boundaries.
//! 3. Pull `chunk_size` qualifying rows at a time, in document order.
//! 4. Emit the final partial group as-is (never padded or dropped).
//!
//! Chunks are produced lazily by [`RowChunks`]. Nothing is cached between
//! calls; re-running the chunker re-reads the document from the start.
//!
//! # Example
//!
//! ```rust
//! use rowctx::chunk::{chunk_document, RowFilter};
//! use rowctx::models::Document;
//!
//! let doc = Document::from_pairs("d", "src", "tr", &[("a", "A"), ("b", ""), ("c", "C")]);
//! let chunks: Vec<_> = chunk_document(&doc, "src", "tr", 2, RowFilter::new(true))
//!     .unwrap()
//!     .collect();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].pairs[1].source, "c");
//! ```

use std::ops::RangeInclusive;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::corpus::DocumentCorpus;
use crate::error::{ContextError, ContextResult};
use crate::models::{ContextChunk, Document, Row, TranslationPair};

/// Which raw rows of a document are eligible for chunking.
///
/// Rows inside the excluded range are dropped first, then (if
/// `only_translated_rows` is set) rows with an absent or blank translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    only_translated_rows: bool,
    excluded: Option<RangeInclusive<usize>>,
}

impl RowFilter {
    pub fn new(only_translated_rows: bool) -> Self {
        Self {
            only_translated_rows,
            excluded: None,
        }
    }

    /// Leave out the raw rows in `range`.
    pub fn excluding(mut self, range: RangeInclusive<usize>) -> Self {
        self.excluded = Some(range);
        self
    }

    pub fn excluded(&self) -> Option<&RangeInclusive<usize>> {
        self.excluded.as_ref()
    }

    pub fn accepts(&self, raw_index: usize, row: &Row) -> bool {
        if self
            .excluded
            .as_ref()
            .is_some_and(|range| range.contains(&raw_index))
        {
            return false;
        }
        !self.only_translated_rows || row.is_translated()
    }
}

/// Lazy, forward-only sequence of chunks over one document.
pub struct RowChunks<'a> {
    document: String,
    rows: Box<dyn Iterator<Item = (usize, Row)> + 'a>,
    chunk_size: usize,
    next_index: usize,
}

impl<'a> RowChunks<'a> {
    /// Chunk an arbitrary row sequence belonging to `document`.
    pub fn new<I>(
        document: impl Into<String>,
        rows: I,
        chunk_size: usize,
        filter: RowFilter,
    ) -> ContextResult<Self>
    where
        I: Iterator<Item = Row> + 'a,
    {
        if chunk_size < 1 {
            return Err(ContextError::invalid("chunk_size must be >= 1"));
        }
        let rows = rows
            .enumerate()
            .filter(move |(raw_index, row)| filter.accepts(*raw_index, row));
        Ok(Self {
            document: document.into(),
            rows: Box::new(rows),
            chunk_size,
            next_index: 0,
        })
    }
}

impl Iterator for RowChunks<'_> {
    type Item = ContextChunk;

    fn next(&mut self) -> Option<ContextChunk> {
        // Grown from real rows; chunk_size may be far larger than the document.
        let mut pairs = Vec::new();
        let mut source_rows = Vec::new();

        for (raw_index, row) in self.rows.by_ref().take(self.chunk_size) {
            pairs.push(TranslationPair {
                source: row.source_text,
                translation: row.translated_text.unwrap_or_default(),
            });
            source_rows.push(raw_index);
        }

        if pairs.is_empty() {
            return None;
        }

        let start_index = self.next_index;
        self.next_index += pairs.len();
        Some(make_chunk(&self.document, start_index, pairs, source_rows))
    }
}

/// Chunk a document by reading its rows directly.
pub fn chunk_document<'a>(
    document: &'a Document,
    source_column: &str,
    translation_column: &str,
    chunk_size: usize,
    filter: RowFilter,
) -> ContextResult<RowChunks<'a>> {
    warn_missing_columns(document, source_column, translation_column);
    RowChunks::new(
        document.handle.clone(),
        document.rows(source_column, translation_column),
        chunk_size,
        filter,
    )
}

/// Chunk a document, reading its rows through `corpus`.
pub fn chunk_from_corpus<'a, C: DocumentCorpus + ?Sized>(
    corpus: &'a C,
    document: &'a Document,
    source_column: &str,
    translation_column: &str,
    chunk_size: usize,
    filter: RowFilter,
) -> ContextResult<RowChunks<'a>> {
    warn_missing_columns(document, source_column, translation_column);
    RowChunks::new(
        document.handle.clone(),
        corpus.rows(document, source_column, translation_column),
        chunk_size,
        filter,
    )
}

fn warn_missing_columns(document: &Document, source_column: &str, translation_column: &str) {
    if !document.has_columns(source_column, translation_column) {
        warn!(
            document = %document.handle,
            source_column,
            translation_column,
            "document lacks a requested column, contributing no chunks"
        );
    }
}

/// Build a [`ContextChunk`] with a SHA-256 hash over its pair texts.
fn make_chunk(
    document: &str,
    start_index: usize,
    pairs: Vec<TranslationPair>,
    source_rows: Vec<usize>,
) -> ContextChunk {
    let mut hasher = Sha256::new();
    for pair in &pairs {
        hasher.update(pair.source.as_bytes());
        hasher.update([0x1f]);
        hasher.update(pair.translation.as_bytes());
        hasher.update([0x1e]);
    }
    let hash = format!("{:x}", hasher.finalize());

    ContextChunk {
        document: document.to_string(),
        start_index,
        end_index: start_index + pairs.len() - 1,
        pairs,
        source_rows,
        hash,
    }
}
