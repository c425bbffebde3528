//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// Component configs live next to the components that use them
pub use crate::analysis::{AnalysisConfig, ScoringWeights};
use crate::analysis::risk::MAX_WEIGHT;
pub use crate::notify::TelegramConfig;
pub use crate::scanner::ScannerConfig;

use crate::analysis::NarrativeMatcher;

/// getSignaturesForAddress refuses larger limits
const MAX_SIGNATURE_LIMIT: usize = 1000;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    /// Per-call timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_stats_path")]
    pub path: PathBuf,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            path: default_stats_path(),
        }
    }
}

// Default value functions
fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn default_timeout_ms() -> u64 {
    15000
}

fn default_stats_path() -> PathBuf {
    PathBuf::from("scanner-stats.json")
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SCANNER_)
            .add_source(
                config::Environment::with_prefix("SCANNER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("analysis.ai_keywords")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            anyhow::bail!("rpc.endpoint must be an http(s) URL, got {}", mask_url(&self.rpc.endpoint));
        }
        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be positive");
        }

        if self.scanner.poll_interval_ms == 0 {
            anyhow::bail!("scanner.poll_interval_ms must be positive");
        }
        if self.scanner.signature_window == 0 || self.scanner.signature_window > MAX_SIGNATURE_LIMIT {
            anyhow::bail!(
                "scanner.signature_window must be between 1 and {}, got {}",
                MAX_SIGNATURE_LIMIT,
                self.scanner.signature_window
            );
        }
        if self.scanner.dedupe_capacity == 0 {
            anyhow::bail!("scanner.dedupe_capacity must be positive");
        }
        Pubkey::from_str(&self.scanner.token_program)
            .with_context(|| format!("Invalid scanner.token_program: {}", self.scanner.token_program))?;

        if self.analysis.dev_lookback_limit == 0 || self.analysis.dev_lookback_limit > MAX_SIGNATURE_LIMIT {
            anyhow::bail!(
                "analysis.dev_lookback_limit must be between 1 and {}, got {}",
                MAX_SIGNATURE_LIMIT,
                self.analysis.dev_lookback_limit
            );
        }
        for (name, value) in [
            ("dev_holding_limit_pct", self.analysis.dev_holding_limit_pct),
            ("top10_limit_pct", self.analysis.top10_limit_pct),
        ] {
            if !(0.0..=100.0).contains(&value) {
                anyhow::bail!("analysis.{} must be between 0 and 100, got {}", name, value);
            }
        }
        if !self.analysis.min_liquidity_sol.is_finite() || self.analysis.min_liquidity_sol < 0.0 {
            anyhow::bail!("analysis.min_liquidity_sol cannot be negative");
        }
        if self.analysis.lookup_concurrency == 0 {
            anyhow::bail!("analysis.lookup_concurrency must be positive");
        }
        NarrativeMatcher::new(&self.analysis.ai_keywords).context("Invalid analysis.ai_keywords")?;

        let scoring = &self.scoring;
        for (name, value) in [
            ("baseline", scoring.baseline),
            ("creator_in", scoring.creator_in),
            ("top10", scoring.top10),
            ("low_holders", scoring.low_holders),
            ("narrative", scoring.narrative),
        ] {
            if !(-MAX_WEIGHT..=MAX_WEIGHT).contains(&value) {
                anyhow::bail!("scoring.{} must be between -{} and {}, got {}", name, MAX_WEIGHT, MAX_WEIGHT, value);
            }
        }

        let telegram = &self.telegram;
        if telegram.bot_token.trim().is_empty() != telegram.chat_id.trim().is_empty() {
            tracing::warn!("Only one of telegram.bot_token / telegram.chat_id is set - alerts will only be logged");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    timeout: {}ms
  Scanner:
    poll_interval: {}ms
    signature_window: {}
    token_program: {}
    dedupe_capacity: {}
  Analysis:
    dev_lookback_limit: {}
    dev_holding_limit: {}%
    top10_limit: {}%
    min_holders: {}
    min_liquidity: {} SOL
    ai_keywords: {:?}
    lookup_concurrency: {}
  Scoring:
    baseline: {}
    creator_in: +{}
    top10: +{}
    low_holders: +{}
    narrative: +{}
  Telegram:
    bot_token: {}
    chat_id: {}
  Stats:
    path: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.scanner.poll_interval_ms,
            self.scanner.signature_window,
            self.scanner.token_program,
            self.scanner.dedupe_capacity,
            self.analysis.dev_lookback_limit,
            self.analysis.dev_holding_limit_pct,
            self.analysis.top10_limit_pct,
            self.analysis.min_holders,
            self.analysis.min_liquidity_sol,
            self.analysis.ai_keywords,
            self.analysis.lookup_concurrency,
            self.scoring.baseline,
            self.scoring.creator_in,
            self.scoring.top10,
            self.scoring.low_holders,
            self.scoring.narrative,
            mask_secret(&self.telegram.bot_token),
            mask_secret(&self.telegram.chat_id),
            self.stats.path.display(),
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

fn mask_secret(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "(not set)"
    } else {
        "***"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            scanner: ScannerConfig::default(),
            analysis: AnalysisConfig::default(),
            scoring: ScoringWeights::default(),
            telegram: TelegramConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}
