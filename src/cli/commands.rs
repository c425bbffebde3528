//! CLI command implementations

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::chain::RpcChainClient;
use crate::config::Config;
use crate::notify;
use crate::scanner::Scanner;
use crate::stats::{Outcome, StatsStore};

/// Start the scanner
pub async fn start(config: &Config) -> Result<()> {
    info!("Starting mint scanner...");
    info!(
        "Window: {} signatures every {}ms, creator lookback: {}",
        config.scanner.signature_window, config.scanner.poll_interval_ms, config.analysis.dev_lookback_limit
    );

    let client = Arc::new(RpcChainClient::new(
        config.rpc.endpoint.clone(),
        Duration::from_millis(config.rpc.timeout_ms),
    ));

    // Unreachable RPC is not fatal here, the loop reports cycle errors itself
    match client.health().await {
        Ok(slot) => info!(slot, "RPC reachable"),
        Err(e) => warn!(error = %e, "RPC health probe failed, starting anyway"),
    }

    let notifier = notify::from_config(&config.telegram).context("Failed to create notifier")?;
    let stats = StatsStore::load(&config.stats.path).await;

    let mut scanner =
        Scanner::new(client, config, notifier, stats).context("Failed to initialize scanner")?;
    scanner.run().await.context("Scanner stopped with an error")?;

    info!("Scanner stopped");
    Ok(())
}

/// Print persisted stats
pub async fn stats(config: &Config, json: bool) -> Result<()> {
    let stats = StatsStore::read(&config.stats.path)
        .await
        .with_context(|| format!("Failed to read {}", config.stats.path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n=== MINT SCANNER STATS ===\n");
    println!("Scanner: {}", if stats.scanner_on { "ON" } else { "OFF" });
    println!("Mints scanned: {}", stats.scanned);
    println!("Wins: {}  Losses: {}", stats.wins, stats.losses);
    match stats.win_rate() {
        Some(rate) => println!("Win rate: {:.1}%", rate),
        None => println!("Win rate: n/a"),
    }
    println!("Last error: {}", stats.last_error.as_deref().unwrap_or("none"));

    println!("\n=== RECENT ALERTS ({}) ===\n", stats.alerts.len());
    if stats.alerts.is_empty() {
        println!("No alerts yet.");
    }
    for alert in stats.alerts.iter().take(20) {
        println!("{}\n", alert);
    }

    Ok(())
}

/// Record an operator verdict
pub async fn mark(config: &Config, outcome: Outcome) -> Result<()> {
    let stats = StatsStore::mark(&config.stats.path, outcome)
        .await
        .with_context(|| format!("Failed to update {}", config.stats.path.display()))?;

    println!("Recorded {:?}. Wins: {}  Losses: {}", outcome, stats.wins, stats.losses);
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check system health
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;

    // Check RPC
    print!("RPC Endpoint... ");
    match check_rpc(config).await {
        Ok((slot, latency)) => println!("OK (slot {}, {}ms)", slot, latency),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    // Check stats file
    print!("Stats file... ");
    match StatsStore::read(&config.stats.path).await {
        Ok(stats) => println!(
            "OK ({}, scanner {})",
            config.stats.path.display(),
            if stats.scanner_on { "on" } else { "off" }
        ),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    // Telegram is optional
    print!("Telegram... ");
    if config.telegram.is_configured() {
        println!("CONFIGURED");
    } else {
        println!("NOT SET (alerts go to the log)");
    }

    println!();
    if all_healthy {
        println!("All systems healthy!");
        Ok(())
    } else {
        anyhow::bail!("Some systems are unhealthy. Check the errors above.")
    }
}

async fn check_rpc(config: &Config) -> Result<(u64, u64)> {
    let client = RpcChainClient::new(
        config.rpc.endpoint.clone(),
        Duration::from_millis(config.rpc.timeout_ms),
    );

    let start = Instant::now();
    let slot = client.health().await?;
    let latency = start.elapsed().as_millis() as u64;

    Ok((slot, latency))
}
