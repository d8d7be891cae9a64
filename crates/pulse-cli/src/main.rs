//! Pulse CLI - Studio dashboards from the command line
//!
//! Usage:
//!   pulse dashboard billing             Billing dashboard (last 30 days)
//!   pulse dashboard wallet --input FILE Wallet dashboard from an export
//!   pulse search "ana"                  Cross-entity search
//!   pulse config                        Show the resolved configuration

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Dashboard {
            domain,
            source,
            view,
        } => commands::cmd_dashboard(config_path, &domain, &source, &view).await,
        Commands::Search {
            query,
            source,
            view,
        } => commands::cmd_search(config_path, &query, &source, &view).await,
        Commands::Config => commands::cmd_config(config_path),
        Commands::Sample { domain } => commands::cmd_sample(&domain),
    }
}
