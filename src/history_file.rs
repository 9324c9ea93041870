//! JSON persistence for summary history.
//!
//! The engine itself never touches disk; this is the file-backed
//! collaborator used by the CLI to hydrate the store at start-up and to
//! save it after each recorded summary.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::SummaryEntry;

/// Read entries from `path`. A missing file is an empty history.
pub fn load_history(path: &Path) -> Result<Vec<SummaryEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file: {}", path.display()))?;
    let entries = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file: {}", path.display()))?;
    Ok(entries)
}

/// Write entries to `path` as pretty JSON, creating parent directories.
pub fn save_history(path: &Path, entries: &[SummaryEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write history file: {}", path.display()))?;
    Ok(())
}
