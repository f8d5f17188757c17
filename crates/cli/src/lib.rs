//! `lootsplit` command line: run the fair-share split over a JSON snapshot file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use lootsplit_allocation::{ItemSnapshot, RequestSnapshot, compute_split, summarize_by_member};
use lootsplit_observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "lootsplit", about = "Suggest a fair loot split from a board snapshot")]
pub struct Cli {
    /// Log output format (overrides LOOTSPLIT_LOG_FORMAT).
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Per-item allocation, keyed by item id.
    Split {
        /// Snapshot file: `{ "items": [...], "requests": [...] }`.
        snapshot: PathBuf,
    },
    /// Suggested units per member across all items.
    Summary { snapshot: PathBuf },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

/// Items and requests as exported by the surrounding application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub items: Vec<ItemSnapshot>,
    #[serde(default)]
    pub requests: Vec<RequestSnapshot>,
}

impl BoardSnapshot {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("snapshot is not valid JSON for items/requests")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse snapshot {}", path.display()))
    }
}

/// Execute a subcommand and return the pretty-printed JSON result.
pub fn run(command: &Command) -> anyhow::Result<String> {
    match command {
        Command::Split { snapshot } => {
            let board = BoardSnapshot::load(snapshot)?;
            render_split(&board)
        }
        Command::Summary { snapshot } => {
            let board = BoardSnapshot::load(snapshot)?;
            render_summary(&board)
        }
    }
}

pub fn render_split(board: &BoardSnapshot) -> anyhow::Result<String> {
    let split = compute_split(&board.items, &board.requests);
    info!(
        items = board.items.len(),
        requests = board.requests.len(),
        allocated_items = split.len(),
        "computed split"
    );
    serde_json::to_string_pretty(&split).context("failed to encode split")
}

pub fn render_summary(board: &BoardSnapshot) -> anyhow::Result<String> {
    let totals = summarize_by_member(&board.items, &board.requests);
    info!(members = totals.len(), "computed member totals");
    serde_json::to_string_pretty(&totals).context("failed to encode totals")
}
