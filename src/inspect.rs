//! Size estimates and document checks for a context request.
//!
//! Unlike selection, these walk every qualifying row of every requested
//! document; they answer "how much context is there" rather than "what goes
//! into the next request".

use serde::Serialize;

use crate::corpus::DocumentCorpus;
use crate::error::ContextResult;
use crate::request::ContextRequestSpec;

/// Rough characters-per-token ratio (4 chars ≈ 1 token).
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextEstimate {
    /// Qualifying rows across all requested documents.
    pub total_rows: usize,
    /// Chunks available before `max_chunks` truncation.
    pub total_chunks: usize,
    /// Characters of source plus translation text in qualifying rows.
    pub total_chars: usize,
    pub estimated_tokens: usize,
    /// Chunks that one request will actually carry.
    pub chunks_per_request: usize,
}

/// Measure what `spec` could draw from, ignoring `max_chunks`.
pub fn estimate_context<C: DocumentCorpus + ?Sized>(
    corpus: &C,
    spec: &ContextRequestSpec,
) -> ContextResult<ContextEstimate> {
    spec.validate()?;

    let mut estimate = ContextEstimate::default();
    for handle in spec.unique_documents() {
        let document = corpus.resolve(handle)?;
        let filter = spec.row_filter(handle);
        let mut rows = 0usize;
        let all_rows = corpus.rows(&document, &spec.source_column, &spec.translation_column);
        for (raw_index, row) in all_rows.enumerate() {
            if !filter.accepts(raw_index, &row) {
                continue;
            }
            rows += 1;
            estimate.total_chars += row.source_text.chars().count()
                + row.translated_text.map_or(0, |t| t.chars().count());
        }
        estimate.total_rows += rows;
        estimate.total_chunks += rows.div_ceil(spec.chunk_size);
    }

    estimate.estimated_tokens = estimate.total_chars / CHARS_PER_TOKEN;
    estimate.chunks_per_request = estimate.total_chunks.min(spec.max_chunks);
    Ok(estimate)
}

/// Whether one requested document is usable as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentCheck {
    pub handle: String,
    pub resolved: bool,
    pub has_source_column: bool,
    pub has_translation_column: bool,
}

impl DocumentCheck {
    pub fn is_valid(&self) -> bool {
        self.resolved && self.has_source_column && self.has_translation_column
    }
}

/// Check every requested handle without failing on the first bad one.
pub fn validate_documents<C: DocumentCorpus + ?Sized>(
    corpus: &C,
    spec: &ContextRequestSpec,
) -> Vec<DocumentCheck> {
    spec.unique_documents()
        .into_iter()
        .map(|handle| match corpus.resolve(handle) {
            Ok(doc) => DocumentCheck {
                handle: handle.to_string(),
                resolved: true,
                has_source_column: doc.column_index(&spec.source_column).is_some(),
                has_translation_column: doc.column_index(&spec.translation_column).is_some(),
            },
            Err(_) => DocumentCheck {
                handle: handle.to_string(),
                resolved: false,
                has_source_column: false,
                has_translation_column: false,
            },
        })
        .collect()
}
