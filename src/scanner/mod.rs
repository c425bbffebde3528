//! Scan orchestrator
//!
//! Polls the token program's recent signatures, extracts mint initializations
//! and runs each new mint through the analysis pipeline exactly once. Alerts go
//! to the notifier, suppressed mints only to the audit log.
//!
//! A failure to fetch the signature window aborts the cycle: the error is
//! recorded and reported, and the next cycle runs after the usual interval.
//! Anything that fails further down (one transaction, one mint) is skipped.

pub mod dedupe;
pub mod pipeline;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::analysis::MintEvent;
use crate::chain::{parse, ChainDataClient};
use crate::config::Config;
use crate::error::Result;
use crate::notify::{escape_html, strip_tags, Notifier};
use crate::stats::{RunStats, StatsStore};

pub use dedupe::DedupeRegistry;
pub use pipeline::{Evaluation, MintEvaluator};

/// Polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Recent token-program signatures inspected per cycle
    #[serde(default = "default_signature_window")]
    pub signature_window: usize,

    /// Program whose transactions are scanned for new mints
    #[serde(default = "default_token_program")]
    pub token_program: String,

    /// Mints remembered for deduplication
    #[serde(default = "default_dedupe_capacity")]
    pub dedupe_capacity: usize,
}

fn default_poll_interval_ms() -> u64 { 5000 }
fn default_signature_window() -> usize { 40 }
fn default_token_program() -> String { spl_token::id().to_string() }
fn default_dedupe_capacity() -> usize { 50_000 }

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            signature_window: default_signature_window(),
            token_program: default_token_program(),
            dedupe_capacity: default_dedupe_capacity(),
        }
    }
}

/// Summary of one scan cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// Signatures returned by the node
    pub signatures: usize,
    /// Signatures not seen in an earlier cycle
    pub new_signatures: usize,
    /// Transactions that could not be fetched, were unparsed or failed on-chain
    pub transactions_skipped: usize,
    /// Mint initializations found, duplicates included
    pub mints_found: usize,
    pub duplicates: usize,
    pub shown: usize,
    pub suppressed: usize,
}

/// Drives the scan loop
pub struct Scanner {
    client: Arc<dyn ChainDataClient>,
    evaluator: MintEvaluator,
    mints: DedupeRegistry,
    /// Signatures already inspected, so overlapping windows are not refetched
    signatures: DedupeRegistry,
    notifier: Box<dyn Notifier>,
    stats: StatsStore,
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(
        client: Arc<dyn ChainDataClient>,
        config: &Config,
        notifier: Box<dyn Notifier>,
        stats: StatsStore,
    ) -> Result<Self> {
        Ok(Self {
            evaluator: MintEvaluator::new(client.clone(), &config.analysis, config.scoring.clone())?,
            mints: DedupeRegistry::new(config.scanner.dedupe_capacity),
            signatures: DedupeRegistry::new(config.scanner.signature_window.saturating_mul(50)),
            client,
            notifier,
            stats,
            config: config.scanner.clone(),
        })
    }

    pub fn stats(&self) -> &RunStats {
        self.stats.stats()
    }

    /// Scan until Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Scan until `shutdown` resolves, then persist stats
    ///
    /// A cycle in flight when `shutdown` resolves runs to completion so every
    /// admitted mint is routed.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) -> Result<()> {
        tokio::pin!(shutdown);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        self.stats.stats_mut().scanner_on = true;
        self.persist().await;
        info!(
            program = %self.config.token_program,
            window = self.config.signature_window,
            interval_ms = self.config.poll_interval_ms,
            notifier = self.notifier.name(),
            "Scanner started"
        );
        self.notify("<b>Mint scanner started</b>").await;

        loop {
            let cycle = self.cycle();
            tokio::pin!(cycle);
            tokio::select! {
                _ = &mut cycle => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, finishing current cycle");
                    cycle.await;
                    break;
                }
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Shutdown requested, stopping scanner");
        self.stats.stats_mut().scanner_on = false;
        self.stats.save().await?;
        Ok(())
    }

    /// One cycle with error routing and persistence
    async fn cycle(&mut self) -> Option<CycleReport> {
        let outcome = self.scan_once().await;
        let report = match outcome {
            Ok(report) => {
                info!(
                    signatures = report.signatures,
                    new_signatures = report.new_signatures,
                    skipped = report.transactions_skipped,
                    mints = report.mints_found,
                    duplicates = report.duplicates,
                    shown = report.shown,
                    suppressed = report.suppressed,
                    "Scan cycle complete"
                );
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "Scan cycle failed");
                self.stats.stats_mut().record_error(e.to_string());
                self.notify(&format!("<b>Scanner error</b>: {}", escape_html(&e.to_string())))
                    .await;
                None
            }
        };
        self.persist().await;
        report
    }

    /// Inspect the current signature window once
    pub async fn scan_once(&mut self) -> Result<CycleReport> {
        let signatures = self
            .client
            .recent_signatures(&self.config.token_program, self.config.signature_window)
            .await?;

        let mut report = CycleReport {
            signatures: signatures.len(),
            ..Default::default()
        };

        for signature in &signatures {
            if self.signatures.has_seen(signature) {
                continue;
            }
            report.new_signatures += 1;

            let tx = match self.client.parsed_transaction(signature).await {
                Ok(Some(tx)) => tx,
                Ok(None) => {
                    debug!(signature = %signature, "Transaction unavailable");
                    self.signatures.mark_seen(signature);
                    report.transactions_skipped += 1;
                    continue;
                }
                Err(e) => {
                    // Not marked, a later cycle may fetch it
                    debug!(signature = %signature, error = %e, "Transaction lookup failed");
                    report.transactions_skipped += 1;
                    continue;
                }
            };
            self.signatures.mark_seen(signature);

            if tx.failed {
                report.transactions_skipped += 1;
                continue;
            }

            for mint in parse::mint_initializations(&tx) {
                report.mints_found += 1;
                if !self.mints.check_and_mark(&mint) {
                    report.duplicates += 1;
                    continue;
                }

                let event = MintEvent {
                    mint_address: mint,
                    signature: signature.clone(),
                    slot: tx.slot,
                    discovered_at: Utc::now(),
                };
                let evaluation = self.evaluator.evaluate(event).await;
                if evaluation.decision.show {
                    report.shown += 1;
                } else {
                    report.suppressed += 1;
                }
                self.route(&evaluation).await;
            }
        }

        Ok(report)
    }

    async fn route(&mut self, evaluation: &Evaluation) {
        let decision = &evaluation.decision;
        self.stats.stats_mut().record_scanned();

        if decision.show {
            self.notify(&decision.rendered_message).await;
        } else {
            info!(
                mint = %decision.mint,
                reason = ?decision.reason_code.map(|r| r.to_string()),
                triggered = decision.triggered_reasons.len(),
                "Alert suppressed"
            );
            self.stats.stats_mut().record_alert(&decision.rendered_message);
        }
    }

    /// Send and mirror into the audit log; delivery failures are only logged
    async fn notify(&mut self, message: &str) {
        self.stats.stats_mut().record_alert(&strip_tags(message));
        if let Err(e) = self.notifier.send(message).await {
            warn!(notifier = self.notifier.name(), error = %e, "Notification failed");
        }
    }

    async fn persist(&mut self) {
        if let Err(e) = self.stats.save().await {
            warn!(error = %e, "Failed to persist stats");
        }
    }
}
