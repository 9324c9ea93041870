//! # rowctx
//!
//! Bounded context assembly and summary history for row-based translation
//! work.
//!
//! rowctx reads previously translated rows from one or more documents,
//! cuts them into fixed-size chunks of `(source, translation)` pairs, and
//! returns a size-capped bundle that a caller can hand to an external
//! translation or summary model. It also keeps a small, bounded history of
//! generated summaries with deterministic oldest-first eviction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌─────────┐   ┌──────────────┐
//! │ContextEngine │──▶│ Selector │──▶│ Chunker │──▶│DocumentCorpus│
//! │  (facade)    │   └──────────┘   └─────────┘   │ (read-only)  │
//! │              │──▶┌──────────────┐             └──────────────┘
//! └──────────────┘   │ HistoryStore │
//!                    └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Request facade |
//! | [`select`] | Multi-document context selection |
//! | [`chunk`] | Lazy row chunker |
//! | [`history`] | Bounded summary history |
//! | [`corpus`] | Document access trait and in-memory corpus |
//! | [`models`] | Core data types |
//! | [`request`] | Per-request context parameters |
//! | [`render`] | Bundle to message pairs |
//! | [`inspect`] | Size estimates and document checks |
//! | [`history_file`] | JSON history persistence |
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Typed engine errors |

pub mod chunk;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod history;
pub mod history_file;
pub mod inspect;
pub mod models;
pub mod render;
pub mod request;
pub mod select;
