//! Run statistics and the recent-alert audit log
//!
//! Stats live in a single JSON file. The scanner owns the counters, the alert
//! log and the error state; the operator owns the win/loss tallies, which are
//! changed out-of-process by `mint-scanner mark`. Saving therefore re-reads the
//! tallies from disk instead of overwriting them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Alert log entries kept, newest first
pub const MAX_ALERTS: usize = 200;

/// Operator verdict on an alerted token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    #[value(alias = "lose")]
    Loss,
}

/// Persisted statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Mints evaluated since the file was created
    #[serde(default)]
    pub scanned: u64,

    /// "<timestamp> | <message>", newest first
    #[serde(default)]
    pub alerts: Vec<String>,

    #[serde(default)]
    pub wins: u64,

    #[serde(default)]
    pub losses: u64,

    #[serde(default)]
    pub scanner_on: bool,

    #[serde(default)]
    pub last_error: Option<String>,
}

impl RunStats {
    /// Prepend a timestamped entry, evicting the oldest past `MAX_ALERTS`
    pub fn record_alert(&mut self, message: &str) {
        let entry = format!("{} | {}", Utc::now().to_rfc3339(), message);
        self.alerts.insert(0, entry);
        self.alerts.truncate(MAX_ALERTS);
    }

    pub fn record_scanned(&mut self) {
        self.scanned += 1;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
    }

    /// Percentage of marked alerts that were wins
    pub fn win_rate(&self) -> Option<f64> {
        let total = self.wins + self.losses;
        if total == 0 {
            return None;
        }
        Some(self.wins as f64 / total as f64 * 100.0)
    }
}

/// File-backed holder of [`RunStats`]
pub struct StatsStore {
    path: PathBuf,
    stats: RunStats,
}

impl StatsStore {
    /// Load stats, starting fresh when the file is missing or unreadable
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stats = match read_stats(&path).await {
            Ok(Some(stats)) => {
                info!(
                    path = %path.display(),
                    scanned = stats.scanned,
                    alerts = stats.alerts.len(),
                    "Loaded stats"
                );
                stats
            }
            Ok(None) => {
                debug!(path = %path.display(), "No stats file, starting fresh");
                RunStats::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Stats file unreadable, starting fresh");
                RunStats::default()
            }
        };
        Self { path, stats }
    }

    /// Read stats strictly; a corrupt file is an error
    pub async fn read(path: &Path) -> Result<RunStats> {
        Ok(read_stats(path).await?.unwrap_or_default())
    }

    /// Increment a tally directly in the file
    pub async fn mark(path: &Path, outcome: Outcome) -> Result<RunStats> {
        let mut stats = Self::read(path).await?;
        stats.record_outcome(outcome);
        write_stats(path, &stats).await?;
        info!(path = %path.display(), ?outcome, wins = stats.wins, losses = stats.losses, "Outcome recorded");
        Ok(stats)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut RunStats {
        &mut self.stats
    }

    /// Persist, adopting whatever win/loss tallies are on disk
    pub async fn save(&mut self) -> Result<()> {
        match read_stats(&self.path).await {
            Ok(Some(on_disk)) => {
                self.stats.wins = on_disk.wins;
                self.stats.losses = on_disk.losses;
            }
            Ok(None) => {}
            Err(e) => debug!(path = %self.path.display(), error = %e, "Keeping in-memory tallies"),
        }
        write_stats(&self.path, &self.stats).await
    }
}

async fn read_stats(path: &Path) -> Result<Option<RunStats>> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::StatsPersistence(e.to_string())),
    };

    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| Error::StatsPersistence(format!("{}: {}", path.display(), e)))
}

/// Write through a sibling temp file so readers never see a partial file
async fn write_stats(path: &Path, stats: &RunStats) -> Result<()> {
    let data = serde_json::to_string_pretty(stats)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::StatsPersistence(e.to_string()))?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data)
        .await
        .map_err(|e| Error::StatsPersistence(e.to_string()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::StatsPersistence(e.to_string()))?;

    debug!(path = %path.display(), "Stats saved");
    Ok(())
}
