//! Context selection across documents.
//!
//! The selector operates entirely through the [`DocumentCorpus`] trait. It
//! validates the request, resolves every handle in listed order, then pulls
//! chunks document by document until `max_chunks` have been collected.
//!
//! # Ordering
//!
//! Chunks are ordered by the position of their document in the request,
//! then by ascending row position within the document. Truncation keeps the
//! first `max_chunks` chunks in that order. Rows of documents past the cut
//! are never requested from the corpus.

use std::sync::Arc;

use tracing::debug;

use crate::chunk::chunk_from_corpus;
use crate::corpus::DocumentCorpus;
use crate::error::ContextResult;
use crate::models::{ContextBundle, Document};
use crate::request::ContextRequestSpec;

/// Build a [`ContextBundle`] for `spec`.
///
/// Fails with `InvalidConfiguration` before touching the corpus if `spec`
/// is malformed, and with `UnknownDocument` for the first handle (in listed
/// order) that does not resolve. Either way no rows have been read.
pub fn select_context<C: DocumentCorpus + ?Sized>(
    corpus: &C,
    spec: &ContextRequestSpec,
) -> ContextResult<ContextBundle> {
    spec.validate()?;

    let documents = spec
        .unique_documents()
        .into_iter()
        .map(|handle| corpus.resolve(handle))
        .collect::<ContextResult<Vec<Arc<Document>>>>()?;

    let mut chunks = Vec::new();
    for document in &documents {
        let remaining = spec.max_chunks - chunks.len();
        if remaining == 0 {
            debug!(
                document = %document.handle,
                "max_chunks reached, skipping remaining documents"
            );
            break;
        }

        let before = chunks.len();
        chunks.extend(
            chunk_from_corpus(
                corpus,
                document,
                &spec.source_column,
                &spec.translation_column,
                spec.chunk_size,
                spec.row_filter(&document.handle),
            )?
            .take(remaining),
        );
        debug!(
            document = %document.handle,
            chunks = chunks.len() - before,
            "collected context chunks"
        );
    }

    let bundle = ContextBundle::from_chunks(chunks);
    debug!(
        documents = documents.len(),
        chunks = bundle.chunks.len(),
        pairs = bundle.total_pairs,
        max_chunks = spec.max_chunks,
        "context selection complete"
    );
    Ok(bundle)
}
