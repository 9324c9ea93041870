//! Typed failures for the context and history engine.
//!
//! Engine operations are synchronous and return [`ContextResult`]. Nothing
//! inside the engine retries or suppresses these; the caller decides how
//! they are presented.

use thiserror::Error;

/// Errors raised by chunking, selection, and the history store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A request violates a structural constraint (e.g. `chunk_size == 0`).
    /// Raised before any rows are read.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A document handle did not resolve through the corpus.
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    /// The history store held more entries than its capacity after an append.
    #[error("history holds {len} entries, capacity is {capacity}")]
    CapacityInvariantViolation { len: usize, capacity: usize },
}

pub type ContextResult<T> = Result<T, ContextError>;

impl ContextError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ContextError::InvalidConfiguration(msg.into())
    }
}
