//! Chain data access
//!
//! The scanner only ever reads from the chain, and only through
//! [`ChainDataClient`]. Every method may fail or come back empty; callers treat
//! absence as "unknown", never as zero.

use async_trait::async_trait;

use crate::error::Result;

#[cfg(test)]
pub(crate) mod mock;
pub mod parse;
pub mod rpc;
pub mod types;

pub use rpc::RpcChainClient;
pub use types::{
    HolderBalance, MintAccount, ParsedAccount, ParsedInstruction, ParsedTransaction, TokenAccount,
};

/// Read-only chain data source
#[async_trait]
pub trait ChainDataClient: Send + Sync {
    /// Most recent transaction signatures touching `address`, newest first
    async fn recent_signatures(&self, address: &str, limit: usize) -> Result<Vec<String>>;

    /// Parsed transaction body, `None` when the node cannot return it parsed
    async fn parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>>;

    /// Largest token accounts of a mint, largest first
    async fn largest_holders(&self, mint: &str) -> Result<Vec<HolderBalance>>;

    /// Parsed account info, `None` when the account does not exist
    async fn parsed_account_info(&self, address: &str) -> Result<Option<ParsedAccount>>;

    /// Token accounts of `owner` holding `mint`
    async fn token_accounts_by_owner(&self, owner: &str, mint: &str) -> Result<Vec<TokenAccount>>;
}
