//! Mint Scanner - watches the SPL token program for new mints and filters them
//! through creator-activity and holder-concentration heuristics
//!
//! Alerts are informational only. Nothing here signs or sends transactions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use mint_scanner::cli::commands;
use mint_scanner::config::Config;
use mint_scanner::stats::Outcome;

/// New SPL token mint scanner
#[derive(Parser)]
#[command(name = "mint-scanner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SCANNER_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scanner
    Start,

    /// Show persisted stats and recent alerts
    Stats {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Record the outcome of an alerted token
    Mark {
        #[arg(value_enum)]
        outcome: Outcome,
    },

    /// Check RPC reachability and the stats file
    Health,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Start => commands::start(&config).await,
        Commands::Stats { json } => commands::stats(&config, json).await,
        Commands::Mark { outcome } => commands::mark(&config, outcome).await,
        Commands::Health => commands::health(&config).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mint_scanner=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
