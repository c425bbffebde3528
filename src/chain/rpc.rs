//! Solana JSON-RPC implementation of [`ChainDataClient`]
//!
//! Every call is bounded by the configured timeout. The underlying HTTP client
//! has its own timeout as well, but that one does not cover connection setup
//! stalls on some providers.

use async_trait::async_trait;
use serde_json::json;
use solana_account_decoder::{UiAccount, UiAccountData, UiAccountEncoding};
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcTransactionConfig};
use solana_client::rpc_request::{RpcRequest, TokenAccountsFilter};
use solana_client::rpc_response::Response;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInnerInstructions,
    UiInstruction, UiMessage, UiParsedInstruction, UiTransactionEncoding,
};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::chain::parse;
use crate::chain::types::{HolderBalance, ParsedAccount, ParsedInstruction, ParsedTransaction, TokenAccount};
use crate::chain::ChainDataClient;
use crate::error::{Error, Result};

/// Chain data client backed by a Solana RPC node
pub struct RpcChainClient {
    rpc: RpcClient,
    timeout: Duration,
    commitment: CommitmentConfig,
}

impl RpcChainClient {
    /// Create a client with a per-call timeout
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let commitment = CommitmentConfig::confirmed();
        Self {
            rpc: RpcClient::new_with_timeout_and_commitment(endpoint, timeout, commitment),
            timeout,
            commitment,
        }
    }

    /// Current slot, used as a liveness probe
    pub async fn health(&self) -> Result<u64> {
        self.bounded(self.rpc.get_slot()).await
    }

    /// Run an RPC future under the per-call timeout
    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ClientError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::RpcTimeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl ChainDataClient for RpcChainClient {
    async fn recent_signatures(&self, address: &str, limit: usize) -> Result<Vec<String>> {
        let pubkey = Pubkey::from_str(address)?;
        let config = GetConfirmedSignaturesForAddress2Config {
            limit: Some(limit),
            commitment: Some(self.commitment),
            ..Default::default()
        };

        let statuses = self
            .bounded(self.rpc.get_signatures_for_address_with_config(&pubkey, config))
            .await?;

        Ok(statuses.into_iter().map(|s| s.signature).collect())
    }

    async fn parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>> {
        let sig = Signature::from_str(signature)
            .map_err(|e| Error::InvalidAddress(format!("signature {}: {}", signature, e)))?;
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        let tx = self
            .bounded(self.rpc.get_transaction_with_config(&sig, config))
            .await?;

        Ok(convert_transaction(signature, tx))
    }

    async fn largest_holders(&self, mint: &str) -> Result<Vec<HolderBalance>> {
        let pubkey = Pubkey::from_str(mint)?;
        let balances = self.bounded(self.rpc.get_token_largest_accounts(&pubkey)).await?;

        Ok(balances
            .into_iter()
            .map(|b| HolderBalance {
                ui_amount: b
                    .amount
                    .ui_amount
                    .or_else(|| b.amount.ui_amount_string.parse().ok()),
                address: b.address,
            })
            .collect())
    }

    async fn parsed_account_info(&self, address: &str) -> Result<Option<ParsedAccount>> {
        // Validate locally so a bad address is not reported as an RPC failure
        Pubkey::from_str(address)?;

        let config = RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::JsonParsed),
            commitment: Some(self.commitment),
            ..Default::default()
        };

        // get_account_with_config decodes into binary Account and drops jsonParsed data,
        // so go through the raw request
        let response: Response<Option<UiAccount>> = self
            .bounded(self.rpc.send(RpcRequest::GetAccountInfo, json!([address, config])))
            .await?;

        Ok(response.value.map(|account| convert_account(address, &account)))
    }

    async fn token_accounts_by_owner(&self, owner: &str, mint: &str) -> Result<Vec<TokenAccount>> {
        let owner = Pubkey::from_str(owner)?;
        let mint = Pubkey::from_str(mint)?;

        let keyed = self
            .bounded(
                self.rpc
                    .get_token_accounts_by_owner(&owner, TokenAccountsFilter::Mint(mint)),
            )
            .await?;

        Ok(keyed
            .into_iter()
            .filter_map(|k| match convert_account(&k.pubkey, &k.account) {
                ParsedAccount::Token(account) => Some(account),
                _ => None,
            })
            .collect())
    }
}

fn convert_account(address: &str, account: &UiAccount) -> ParsedAccount {
    match &account.data {
        UiAccountData::Json(parsed) => parse::parse_account(address, &parsed.program, &parsed.parsed),
        _ => ParsedAccount::Other {
            program: account.owner.clone(),
        },
    }
}

fn convert_transaction(
    signature: &str,
    tx: EncodedConfirmedTransactionWithStatusMeta,
) -> Option<ParsedTransaction> {
    let EncodedTransaction::Json(ui_tx) = &tx.transaction.transaction else {
        debug!(signature, "Transaction not returned in JSON encoding");
        return None;
    };
    let UiMessage::Parsed(message) = &ui_tx.message else {
        debug!(signature, "Transaction message not parsed");
        return None;
    };

    let meta = tx.transaction.meta.as_ref();
    let inner: Option<Vec<UiInnerInstructions>> =
        meta.and_then(|m| m.inner_instructions.clone().into());

    Some(ParsedTransaction {
        signature: signature.to_string(),
        slot: tx.slot,
        block_time: tx.block_time,
        instructions: message.instructions.iter().filter_map(convert_instruction).collect(),
        inner_instructions: inner
            .unwrap_or_default()
            .iter()
            .flat_map(|block| block.instructions.iter().filter_map(convert_instruction))
            .collect(),
        failed: meta.map(|m| m.err.is_some()).unwrap_or(false),
    })
}

fn convert_instruction(ix: &UiInstruction) -> Option<ParsedInstruction> {
    match ix {
        UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) => Some(ParsedInstruction {
            program: parsed.program.clone(),
            program_id: parsed.program_id.clone(),
            parsed: Some(parsed.parsed.clone()),
        }),
        UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(partial)) => {
            Some(ParsedInstruction {
                program: String::new(),
                program_id: partial.program_id.clone(),
                parsed: None,
            })
        }
        UiInstruction::Compiled(_) => None,
    }
}
