//! vaxwatch CLI — the main entry point.
//!
//! Commands:
//! - `check`    — Scan centers and notify subscribers (one pass)
//! - `scan`     — Scan centers and print what is available
//! - `onboard`  — Write a starter config file
//! - `doctor`   — Diagnose the configuration

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vaxwatch",
    about = "vaxwatch — vaccination slot watcher",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.vaxwatch/config.toml)
    #[arg(short, long, global = true, env = "VAXWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every center once and notify subscribers
    Check {
        /// First day to look at (YYYY-MM-DD, defaults to tomorrow)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Log who would be notified instead of sending anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Scan every center once and print the results
    Scan {
        /// First day to look at (YYYY-MM-DD, defaults to tomorrow)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write a starter configuration file
    Onboard,

    /// Diagnose configuration problems
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?cli.config, "vaxwatch starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Check { date, dry_run } => {
            commands::check::run(config_path, date, dry_run).await?
        }
        Commands::Scan { date, json } => commands::scan::run(config_path, date, json).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
