//! Turn a bundle into user/assistant example pairs.
//!
//! Each chunk becomes one message pair: its source texts joined with `\n`
//! as the user turn and its translations joined the same way as the
//! assistant turn. Blank texts are dropped before joining, and a chunk
//! whose source or translation side ends up empty is skipped.

use serde::Serialize;

use crate::models::{ContextBundle, ContextChunk};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Attach a `"first-last"` label of raw document rows to each pair.
    pub include_row_numbers: bool,
    /// Present the selected chunks last-first.
    pub newest_first: bool,
}

/// One prior-translation example, ready to be sent as a few-shot turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextMessage {
    pub user: String,
    pub assistant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<String>,
}

pub fn render_messages(bundle: &ContextBundle, options: RenderOptions) -> Vec<ContextMessage> {
    let mut messages: Vec<ContextMessage> = bundle
        .chunks
        .iter()
        .filter_map(|chunk| render_chunk(chunk, options.include_row_numbers))
        .collect();
    if options.newest_first {
        messages.reverse();
    }
    messages
}

fn render_chunk(chunk: &ContextChunk, include_row_numbers: bool) -> Option<ContextMessage> {
    let user = join_texts(chunk.pairs.iter().map(|p| p.source.as_str()));
    let assistant = join_texts(chunk.pairs.iter().map(|p| p.translation.as_str()));
    if user.is_empty() || assistant.is_empty() {
        return None;
    }

    let rows = if include_row_numbers {
        match (chunk.source_rows.first(), chunk.source_rows.last()) {
            (Some(first), Some(last)) => Some(format!("{}-{}", first, last)),
            _ => None,
        }
    } else {
        None
    };

    Some(ContextMessage {
        user,
        assistant,
        rows,
    })
}

fn join_texts<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    texts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
