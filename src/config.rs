use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::render::RenderOptions;
use crate::request::ContextRequestSpec;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub presets: PresetsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ColumnsConfig {
    #[serde(default = "default_source_column")]
    pub source: String,
    #[serde(default = "default_translation_column")]
    pub translation: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            source: default_source_column(),
            translation: default_translation_column(),
        }
    }
}

fn default_source_column() -> String {
    "original text".to_string()
}
fn default_translation_column() -> String {
    "Initial".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default = "default_true")]
    pub only_translated_rows: bool,
    #[serde(default)]
    pub include_row_numbers: bool,
    #[serde(default)]
    pub newest_first: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            only_translated_rows: true,
            include_row_numbers: false,
            newest_first: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Chunk sizing for one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub chunk_size: usize,
    pub max_chunks: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PresetsConfig {
    #[serde(default)]
    pub translation: TranslationPreset,
    #[serde(default)]
    pub summary: SummaryPreset,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslationPreset {
    #[serde(default = "default_translation_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_translation_max_chunks")]
    pub max_chunks: usize,
}

impl Default for TranslationPreset {
    fn default() -> Self {
        Self {
            chunk_size: default_translation_chunk_size(),
            max_chunks: default_translation_max_chunks(),
        }
    }
}

impl TranslationPreset {
    pub fn preset(&self) -> Preset {
        Preset {
            chunk_size: self.chunk_size,
            max_chunks: self.max_chunks,
        }
    }
}

fn default_translation_chunk_size() -> usize {
    50
}
fn default_translation_max_chunks() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryPreset {
    #[serde(default = "default_summary_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_summary_max_chunks")]
    pub max_chunks: usize,
}

impl Default for SummaryPreset {
    fn default() -> Self {
        Self {
            chunk_size: default_summary_chunk_size(),
            max_chunks: default_summary_max_chunks(),
        }
    }
}

impl SummaryPreset {
    pub fn preset(&self) -> Preset {
        Preset {
            chunk_size: self.chunk_size,
            max_chunks: self.max_chunks,
        }
    }
}

fn default_summary_chunk_size() -> usize {
    100
}
fn default_summary_max_chunks() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            capacity: default_history_capacity(),
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from("./data/summary_history.json")
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Config {
    /// All defaults; used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn translation_spec<I, S>(&self, documents: I) -> ContextRequestSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec_with(documents, self.presets.translation.preset())
    }

    pub fn summary_spec<I, S>(&self, documents: I) -> ContextRequestSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec_with(documents, self.presets.summary.preset())
    }

    fn spec_with<I, S>(&self, documents: I, preset: Preset) -> ContextRequestSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContextRequestSpec::new(documents, &self.columns.source, &self.columns.translation)
            .with_chunk_size(preset.chunk_size)
            .with_max_chunks(preset.max_chunks)
            .with_only_translated_rows(self.context.only_translated_rows)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            include_row_numbers: self.context.include_row_numbers,
            newest_first: self.context.newest_first,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    for (name, preset) in [
        ("translation", config.presets.translation.preset()),
        ("summary", config.presets.summary.preset()),
    ] {
        if preset.chunk_size == 0 {
            anyhow::bail!("presets.{}.chunk_size must be > 0", name);
        }
        if preset.max_chunks == 0 {
            anyhow::bail!("presets.{}.max_chunks must be > 0", name);
        }
    }

    if config.history.capacity == 0 {
        anyhow::bail!("history.capacity must be > 0");
    }

    if config.columns.source.trim().is_empty() || config.columns.translation.trim().is_empty() {
        anyhow::bail!("columns.source and columns.translation must be non-empty");
    }

    Ok(config)
}
