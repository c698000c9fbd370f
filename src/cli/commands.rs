use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tickerwatch", about = "Ticker mention detection for trading chat")]
pub struct Cli {
    /// TOML config file (falls back to TICKERWATCH_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create tables and seed the default blacklist
    Init,
    /// Store one message or a JSON array of messages
    Ingest {
        /// JSON with id, channel_id, author_id, text, observed_at (RFC3339)
        json: String,
    },
    /// Score a piece of text without storing anything
    Scan { text: String },
    /// Run one processing pass
    Run {
        /// Channel id, or "all"
        #[arg(long, default_value = "all")]
        source: String,
    },
    /// Poll continuously until Ctrl-C
    Watch {
        #[arg(long, default_value = "all")]
        source: String,
    },
    /// List recorded detections
    Detections {
        #[arg(long)]
        symbol: Option<String>,
        /// YYYY-MM-DD or RFC3339
        #[arg(long)]
        since: Option<String>,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show processing cursors
    Cursor {
        /// Only this source
        #[arg(long)]
        source: Option<String>,
    },
    /// Recompute daily rollups
    Rollup {
        /// Day to recompute, YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        date: Option<String>,
        /// Last day of a range starting at --date
        #[arg(long)]
        to: Option<String>,
    },
    /// Most mentioned symbols from stored rollups
    Top {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// List blacklist rules
    Rules,
    /// Create or replace a blacklist rule
    RuleSet {
        /// JSON with symbol, min_confidence, requires_cashtag, requires_price_context, phrases, is_permanent, notes
        json: String,
    },
    /// Remove a blacklist rule
    RuleDelete { symbol: String },
    /// Add or update a reference registry entry
    RegistryAdd {
        /// JSON with symbol, venue, security_class, is_active, name
        json: String,
    },
    /// Show recent arbitration verdicts
    Verdicts {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}
