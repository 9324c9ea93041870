//! # rowctx CLI
//!
//! Builds context bundles from JSON row documents and manages the summary
//! history file.
//!
//! ## Usage
//!
//! ```bash
//! rowctx --config ./config/rowctx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rowctx context translation --doc a.json` | Bundle for a translate-with-context request |
//! | `rowctx context summary --doc a.json --doc b.json` | Bundle for a summary request |
//! | `rowctx estimate --doc a.json` | Size of all available context |
//! | `rowctx preview --doc a.json --limit 3` | First chunks plus the size estimate |
//! | `rowctx validate --doc a.json` | Check documents resolve and have the columns |
//! | `rowctx history list` | Print the summary history |
//! | `rowctx history record --model m --content "..."` | Append a summary |
//! | `rowctx history clear` | Empty the summary history |
//!
//! Set `RUST_LOG=rowctx=debug` to see selection and eviction details.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rowctx::config::{self, Config};
use rowctx::corpus::{load_json_document, InMemoryCorpus};
use rowctx::engine::ContextEngine;
use rowctx::history::HistoryStore;
use rowctx::history_file::{load_history, save_history};
use rowctx::models::SummaryEntry;
use rowctx::render::render_messages;
use rowctx::request::{ContextRequestSpec, ExcludedRows};

/// rowctx: bounded translation context and summary history.
///
/// Reads an optional TOML configuration file for column names, chunk
/// presets, and the history file location. A missing file means defaults.
#[derive(Parser)]
#[command(name = "rowctx", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rowctx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a context bundle and print it as JSON.
    Context {
        /// Which preset to start from.
        kind: RequestKind,

        /// JSON row document to draw from. Repeat to use several, in order.
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,

        /// Override the preset's rows per chunk.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Override the preset's maximum chunk count.
        #[arg(long)]
        max_chunks: Option<usize>,

        /// Include rows without a translation.
        #[arg(long)]
        all_rows: bool,

        /// Print rendered user/assistant message pairs instead of chunks.
        #[arg(long)]
        messages: bool,

        /// Leave out raw rows START:END (inclusive), e.g. the rows being translated.
        #[arg(long, value_parser = parse_row_range)]
        exclude_rows: Option<(usize, usize)>,
    },

    /// Estimate how much context the documents hold.
    Estimate {
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,

        /// Size chunks with the summary preset instead of the translation one.
        #[arg(long)]
        summary: bool,
    },

    /// Show the first chunks a request would carry, with the size estimate.
    Preview {
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,

        /// Number of chunks to include.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Write the preview to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Use the summary preset instead of the translation one.
        #[arg(long)]
        summary: bool,
    },

    /// Check that documents load and carry the configured columns.
    Validate {
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,
    },

    /// Manage the summary history file.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RequestKind {
    Translation,
    Summary,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print all entries, oldest insertion first.
    List,

    /// Append a generated summary, evicting the oldest if full.
    Record {
        /// Model that produced the summary.
        #[arg(long)]
        model: String,

        /// Summary text.
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the summary text from a file.
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Tokens the generation consumed.
        #[arg(long, default_value_t = 0)]
        tokens: u64,

        /// Instruction the summary was generated with.
        #[arg(long)]
        instruction: Option<String>,

        /// Documents the summary was built from (recorded with the summary preset).
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,
    },

    /// Remove all entries.
    Clear,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Context {
            kind,
            docs,
            chunk_size,
            max_chunks,
            all_rows,
            messages,
            exclude_rows,
        } => {
            let engine = ContextEngine::new(load_corpus(&docs)?);
            let mut spec = match kind {
                RequestKind::Translation => cfg.translation_spec(handles(&docs)),
                RequestKind::Summary => cfg.summary_spec(handles(&docs)),
            };
            if let Some(n) = chunk_size {
                spec = spec.with_chunk_size(n);
            }
            if let Some(n) = max_chunks {
                spec = spec.with_max_chunks(n);
            }
            if all_rows {
                spec = spec.with_only_translated_rows(false);
            }
            if let Some((start, end)) = exclude_rows {
                spec = spec.with_excluded_rows(ExcludedRows::new(start, end));
            }

            let bundle = match kind {
                RequestKind::Translation => engine.get_context_for_translation(&spec)?,
                RequestKind::Summary => engine.get_context_for_summary(&spec)?,
            };
            if messages {
                print_json(&render_messages(&bundle, cfg.render_options()))?;
            } else {
                print_json(&bundle)?;
            }
        }
        Commands::Estimate { docs, summary } => {
            let engine = ContextEngine::new(load_corpus(&docs)?);
            let spec = preset_spec(&cfg, &docs, summary);
            print_json(&engine.estimate(&spec)?)?;
        }
        Commands::Preview {
            docs,
            limit,
            output,
            summary,
        } => {
            let engine = ContextEngine::new(load_corpus(&docs)?);
            let spec = preset_spec(&cfg, &docs, summary);
            let preview = engine.preview(&spec, limit)?;
            let json = serde_json::to_string_pretty(&preview)?;

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &json)
                        .with_context(|| format!("Failed to write preview: {}", path.display()))?;
                    eprintln!(
                        "Previewed {} of {} chunks to {}",
                        preview.bundle.chunks.len(),
                        preview.estimate.total_chunks,
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
        Commands::Validate { docs } => {
            let engine = ContextEngine::new(load_corpus(&docs)?);
            let checks = engine.validate(&cfg.translation_spec(handles(&docs)));
            print_json(&checks)?;
            let invalid = checks.iter().filter(|c| !c.is_valid()).count();
            if invalid > 0 {
                bail!("{} of {} documents are not usable as context", invalid, checks.len());
            }
        }
        Commands::History { action } => run_history(&cfg, action)?,
    }

    Ok(())
}

fn run_history(cfg: &Config, action: HistoryAction) -> Result<()> {
    let path = &cfg.history.path;
    let store = HistoryStore::with_capacity(cfg.history.capacity)?;
    let dropped = store.restore(load_history(path)?)?;
    if !dropped.is_empty() {
        warn!(
            dropped = dropped.len(),
            capacity = store.capacity(),
            "history file held more entries than capacity"
        );
    }

    match action {
        HistoryAction::List => print_json(&store.list())?,
        HistoryAction::Clear => {
            store.clear();
            save_history(path, &store.list())?;
            eprintln!("Summary history cleared.");
        }
        HistoryAction::Record {
            model,
            content,
            content_file,
            tokens,
            instruction,
            docs,
        } => {
            let content = match (content, content_file) {
                (Some(text), _) => text,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read summary: {}", file.display()))?,
                (None, None) => bail!("one of --content or --content-file is required"),
            };

            let mut entry = SummaryEntry::new(model, content, tokens);
            if !docs.is_empty() {
                entry = entry.with_context_spec(cfg.summary_spec(handles(&docs)));
            }
            if let Some(instruction) = instruction {
                entry = entry.with_instruction(instruction);
            }
            let id = entry.id.clone();

            let engine = ContextEngine::with_history(InMemoryCorpus::new(), store);
            if let Some(evicted) = engine.record_summary(entry)? {
                eprintln!(
                    "History full: evicted summary {} from {}",
                    evicted.id,
                    evicted.created_at.to_rfc3339()
                );
            }
            save_history(path, &engine.history())?;
            println!("{}", id);
        }
    }
    Ok(())
}

/// Load every existing document file. Missing files are left out so the
/// engine reports them as unknown documents.
fn load_corpus(paths: &[PathBuf]) -> Result<InMemoryCorpus> {
    let corpus = InMemoryCorpus::new();
    for path in paths {
        if path.exists() {
            corpus.insert(load_json_document(path)?);
        }
    }
    Ok(corpus)
}

fn preset_spec(cfg: &Config, docs: &[PathBuf], summary: bool) -> ContextRequestSpec {
    if summary {
        cfg.summary_spec(handles(docs))
    } else {
        cfg.translation_spec(handles(docs))
    }
}

/// Parse a `START:END` row range.
fn parse_row_range(s: &str) -> Result<(usize, usize), String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid row range (expected START:END): {}", s))?;
    let start = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid range start '{}': {}", start, e))?;
    let end = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid range end '{}': {}", end, e))?;
    Ok((start, end))
}

fn handles(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| handle_for(p)).collect()
}

fn handle_for(path: &Path) -> String {
    path.display().to_string()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
