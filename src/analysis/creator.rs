//! Creator activity analysis
//!
//! Replays a bounded window of the creator's history and sums every token
//! transfer that left an account the creator owns for the mint under analysis.
//! Only inner instructions are inspected, which is where launchpad and DEX
//! programs emit the token movements they perform on the creator's behalf.

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::analysis::types::{CreatorActivity, CreatorActivityResult, LookupCoverage, Percent};
use crate::chain::parse::{self, TokenTransfer, TransferAmount};
use crate::chain::{ChainDataClient, MintAccount, ParsedAccount, ParsedTransaction};
use crate::error::Result;

/// Source accounts remembered across analyses before the cache is reset
const SOURCE_CACHE_CAPACITY: usize = 100_000;

/// Mint and owner of a token account; neither changes over the account's life
#[derive(Debug, Clone, PartialEq)]
struct SourceAccount {
    mint: String,
    owner: String,
}

/// Computes [`CreatorActivity`] for a (mint, creator) pair
pub struct CreatorActivityAnalyzer {
    client: Arc<dyn ChainDataClient>,
    lookback_limit: usize,
    concurrency: usize,
    /// `None` records an address that is not a token account
    source_cache: DashMap<String, Option<SourceAccount>>,
}

impl CreatorActivityAnalyzer {
    pub fn new(client: Arc<dyn ChainDataClient>, lookback_limit: usize, concurrency: usize) -> Self {
        Self {
            client,
            lookback_limit,
            concurrency: concurrency.max(1),
            source_cache: DashMap::new(),
        }
    }

    /// Analyze the creator's position; never fails, failure is part of the result
    ///
    /// `mint_account` is the caller's view of the mint, `None` when it could
    /// not be resolved. Supply-relative figures are then unknown.
    pub async fn analyze(&self, mint: &str, mint_account: Option<&MintAccount>, creator: &str) -> CreatorActivity {
        match self.try_analyze(mint, mint_account, creator).await {
            Ok(result) => {
                debug!(
                    mint = %mint,
                    creator = %creator,
                    balance = ?result.current_balance,
                    outflow = result.cumulative_outflow,
                    scanned = result.coverage.transactions_scanned,
                    complete = result.coverage.is_complete(),
                    "Creator activity analyzed"
                );
                CreatorActivity::Completed(result)
            }
            Err(e) => {
                warn!(mint = %mint, creator = %creator, error = %e, "Creator activity analysis failed");
                CreatorActivity::Failed {
                    creator_address: creator.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_analyze(
        &self,
        mint: &str,
        mint_account: Option<&MintAccount>,
        creator: &str,
    ) -> Result<CreatorActivityResult> {
        Pubkey::from_str(mint)?;
        Pubkey::from_str(creator)?;

        let mut coverage = LookupCoverage {
            signatures_requested: self.lookback_limit,
            ..Default::default()
        };

        let total_supply = mint_account.map(MintAccount::ui_supply);

        let current_balance = match self.client.token_accounts_by_owner(creator, mint).await {
            Ok(accounts) => {
                let balance = accounts.iter().map(|a| a.ui_amount).sum::<Option<f64>>();
                if balance.is_none() {
                    debug!(creator = %creator, "Creator token account returned without a balance");
                    coverage.balance_lookup_failed = true;
                }
                balance
            }
            Err(e) => {
                debug!(creator = %creator, error = %e, "Creator balance lookup failed");
                coverage.balance_lookup_failed = true;
                None
            }
        };

        let signatures = self
            .client
            .recent_signatures(creator, self.lookback_limit)
            .await?;
        coverage.signatures_found = signatures.len();

        let transfers = self.collect_transfers(&signatures, &mut coverage).await;
        let sources = self.resolve_sources(&transfers, &mut coverage).await;

        let mut cumulative_outflow = 0.0;
        for transfer in &transfers {
            let owned = matches!(
                sources.get(&transfer.source),
                Some(Some(src)) if src.mint == mint && src.owner == creator
            );
            if !owned {
                continue;
            }
            match (transfer.amount, mint_account) {
                (TransferAmount::Ui(amount), _) => cumulative_outflow += amount,
                (TransferAmount::Raw(raw), Some(mint_account)) => {
                    cumulative_outflow += mint_account.to_ui_amount(raw)
                }
                (TransferAmount::Raw(_), None) => coverage.transfers_unscaled += 1,
            }
        }

        Ok(CreatorActivityResult {
            creator_address: creator.to_string(),
            current_balance,
            cumulative_outflow,
            total_supply,
            outflow_percent_of_supply: Percent::of(cumulative_outflow, total_supply),
            coverage,
        })
    }

    /// Fetch transactions with bounded concurrency and pull out token transfers in feed order
    async fn collect_transfers(&self, signatures: &[String], coverage: &mut LookupCoverage) -> Vec<TokenTransfer> {
        let client = &self.client;
        let fetched: Vec<Result<Option<ParsedTransaction>>> = stream::iter(signatures)
            .map(|sig| client.parsed_transaction(sig))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut transfers = Vec::new();
        for (signature, result) in signatures.iter().zip(fetched) {
            match result {
                Ok(Some(tx)) => {
                    coverage.transactions_scanned += 1;
                    if tx.failed {
                        continue;
                    }
                    transfers.extend(tx.inner_instructions.iter().filter_map(parse::token_transfer));
                }
                Ok(None) => coverage.transactions_unavailable += 1,
                Err(e) => {
                    debug!(signature = %signature, error = %e, "Transaction lookup failed");
                    coverage.transactions_failed += 1;
                }
            }
        }
        transfers
    }

    /// Resolve each distinct transfer source once, consulting the cache first
    async fn resolve_sources(
        &self,
        transfers: &[TokenTransfer],
        coverage: &mut LookupCoverage,
    ) -> HashMap<String, Option<SourceAccount>> {
        let mut resolved = HashMap::new();
        let mut pending = Vec::new();
        let mut queued = HashSet::new();

        for transfer in transfers {
            if resolved.contains_key(&transfer.source) || !queued.insert(transfer.source.clone()) {
                continue;
            }
            match self.source_cache.get(&transfer.source) {
                Some(entry) => {
                    resolved.insert(transfer.source.clone(), entry.value().clone());
                }
                None => pending.push(transfer.source.clone()),
            }
        }

        let client = &self.client;
        let lookups: Vec<(String, Result<Option<ParsedAccount>>)> = stream::iter(pending)
            .map(|address| async move {
                let result = client.parsed_account_info(&address).await;
                (address, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        if self.source_cache.len() + lookups.len() > SOURCE_CACHE_CAPACITY {
            self.source_cache.clear();
        }

        for (address, result) in lookups {
            match result {
                Ok(account) => {
                    let source = account.as_ref().and_then(ParsedAccount::as_token).map(|t| SourceAccount {
                        mint: t.mint.clone(),
                        owner: t.owner.clone(),
                    });
                    // Missing accounts may be closed and reopened later; only cache what exists
                    if account.is_some() {
                        self.source_cache.insert(address.clone(), source.clone());
                    }
                    resolved.insert(address, source);
                }
                Err(e) => {
                    debug!(account = %address, error = %e, "Source account lookup failed");
                    coverage.accounts_failed += 1;
                }
            }
        }

        resolved
    }
}
