//! In-memory chain data client for tests

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::chain::types::{
    HolderBalance, MintAccount, ParsedAccount, ParsedInstruction, ParsedTransaction, TokenAccount,
};
use crate::chain::ChainDataClient;
use crate::error::{Error, Result};

#[derive(Default)]
pub(crate) struct MockChainClient {
    pub signatures: HashMap<String, Vec<String>>,
    pub transactions: HashMap<String, ParsedTransaction>,
    pub holders: HashMap<String, Vec<HolderBalance>>,
    pub accounts: HashMap<String, ParsedAccount>,
    pub token_accounts: HashMap<(String, String), Vec<TokenAccount>>,
    /// Calls keyed by one of these addresses/signatures fail, or "method:key"
    pub failing: HashSet<String>,
    /// Call log, "method:key"
    pub calls: Mutex<Vec<String>>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mint(mut self, mint: &str, supply: u64, decimals: u8, name: Option<&str>) -> Self {
        self.accounts.insert(
            mint.to_string(),
            ParsedAccount::Mint(MintAccount {
                address: mint.to_string(),
                supply,
                decimals,
                name: name.map(str::to_string),
                ..Default::default()
            }),
        );
        self
    }

    pub fn with_token_account(mut self, address: &str, mint: &str, owner: &str, ui_amount: f64) -> Self {
        let account = TokenAccount {
            address: address.to_string(),
            mint: mint.to_string(),
            owner: owner.to_string(),
            ui_amount: Some(ui_amount),
        };
        self.accounts
            .insert(address.to_string(), ParsedAccount::Token(account.clone()));
        self.token_accounts
            .entry((owner.to_string(), mint.to_string()))
            .or_default()
            .push(account);
        self
    }

    pub fn with_holders(mut self, mint: &str, holders: &[(&str, f64)]) -> Self {
        self.holders.insert(
            mint.to_string(),
            holders
                .iter()
                .map(|(address, amount)| HolderBalance {
                    address: address.to_string(),
                    ui_amount: Some(*amount),
                })
                .collect(),
        );
        self
    }

    pub fn with_signatures(mut self, address: &str, signatures: &[&str]) -> Self {
        self.signatures.insert(
            address.to_string(),
            signatures.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_transaction(mut self, tx: ParsedTransaction) -> Self {
        self.transactions.insert(tx.signature.clone(), tx);
        self
    }

    /// Fail every call for `key`, or only one method with `"method:key"`
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, method: &str, key: &str) -> Result<()> {
        let call = format!("{}:{}", method, key);
        self.calls.lock().unwrap().push(call.clone());
        if self.failing.contains(key) || self.failing.contains(&call) {
            return Err(Error::Rpc(format!("mock failure for {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainDataClient for MockChainClient {
    async fn recent_signatures(&self, address: &str, limit: usize) -> Result<Vec<String>> {
        self.record("signatures", address)?;
        Ok(self
            .signatures
            .get(address)
            .map(|s| s.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>> {
        self.record("transaction", signature)?;
        Ok(self.transactions.get(signature).cloned())
    }

    async fn largest_holders(&self, mint: &str) -> Result<Vec<HolderBalance>> {
        self.record("holders", mint)?;
        Ok(self.holders.get(mint).cloned().unwrap_or_default())
    }

    async fn parsed_account_info(&self, address: &str) -> Result<Option<ParsedAccount>> {
        self.record("account", address)?;
        Ok(self.accounts.get(address).cloned())
    }

    async fn token_accounts_by_owner(&self, owner: &str, mint: &str) -> Result<Vec<TokenAccount>> {
        self.record("token_accounts", owner)?;
        Ok(self
            .token_accounts
            .get(&(owner.to_string(), mint.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Top-level `initializeMint` instruction
pub(crate) fn init_mint_ix(mint: &str) -> ParsedInstruction {
    ParsedInstruction {
        program: "spl-token".into(),
        program_id: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".into(),
        parsed: Some(json!({"type": "initializeMint", "info": {"mint": mint, "decimals": 6}})),
    }
}

/// `transferChecked` with a UI amount
pub(crate) fn transfer_checked_ix(source: &str, ui_amount: f64) -> ParsedInstruction {
    ParsedInstruction {
        program: "spl-token".into(),
        program_id: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".into(),
        parsed: Some(json!({
            "type": "transferChecked",
            "info": {
                "source": source,
                "destination": "Elsewhere",
                "tokenAmount": {"uiAmount": ui_amount, "decimals": 6}
            }
        })),
    }
}

/// Plain `transfer` with a raw amount
pub(crate) fn transfer_ix(source: &str, raw_amount: u64) -> ParsedInstruction {
    ParsedInstruction {
        program: "spl-token".into(),
        program_id: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".into(),
        parsed: Some(json!({
            "type": "transfer",
            "info": {"source": source, "destination": "Elsewhere", "amount": raw_amount.to_string()}
        })),
    }
}

pub(crate) fn tx(signature: &str, instructions: Vec<ParsedInstruction>, inner: Vec<ParsedInstruction>) -> ParsedTransaction {
    ParsedTransaction {
        signature: signature.to_string(),
        instructions,
        inner_instructions: inner,
        ..Default::default()
    }
}
