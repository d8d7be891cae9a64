//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Pulse - Studio dashboards from the command line
#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Dashboard aggregation and insights for a training studio", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Engine config file (defaults to the data-dir override, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a domain dashboard
    Dashboard {
        /// Domain: billing, sessions, wallet, plans, notifications, search
        domain: String,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Search across people, plans, sessions and billing
    Search {
        /// Search terms (an empty string lists everything)
        query: String,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show the resolved engine configuration
    Config,

    /// Print the built-in reference rows for a domain as JSON
    Sample {
        /// Domain: billing, sessions, wallet, plans, notifications, search
        domain: String,
    },
}

/// Where rows come from
///
/// With neither flag, PULSE_SOURCE_URL / PULSE_SOURCE_KEY are used when set,
/// otherwise the built-in reference data is shown.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// JSON or CSV file holding the rows
    #[arg(short, long, conflicts_with = "url")]
    pub input: Option<PathBuf>,

    /// Base URL of the hosted store (one table per domain)
    #[arg(long)]
    pub url: Option<String>,

    /// API key sent with --url requests
    #[arg(long, requires = "url")]
    pub key: Option<String>,
}

/// Window, paging and output options
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Trailing window length in days
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub days: Option<u32>,

    /// Window start (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Window end, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Bucket size: day or week
    #[arg(short, long)]
    pub granularity: Option<String>,

    /// Wallet balance at the end of the window
    #[arg(long, allow_hyphen_values = true)]
    pub balance: Option<f64>,

    /// Evaluate as of this instant (RFC 3339) instead of the current time
    #[arg(long)]
    pub now: Option<String>,

    /// Page number (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Rows per page (defaults to the configured page size)
    #[arg(long)]
    pub per_page: Option<usize>,

    /// Print the full envelope as JSON
    #[arg(long)]
    pub json: bool,
}
