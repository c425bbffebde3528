//! Best-effort interpretation of jsonParsed RPC payloads
//!
//! Nothing here fails loudly: a payload that does not have the expected shape
//! simply yields `None` (or `ParsedAccount::Other`) and the caller moves on.

use serde_json::Value;

use crate::chain::types::{MintAccount, ParsedAccount, ParsedInstruction, ParsedTransaction, TokenAccount};

/// Instruction types that create a new mint
const MINT_INIT_TYPES: [&str; 2] = ["initializeMint", "initializeMint2"];

/// Amount carried by a token transfer instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferAmount {
    /// Decimal-adjusted amount (`transferChecked`)
    Ui(f64),
    /// Raw base units (`transfer`), needs the mint's decimals to scale
    Raw(u64),
}

/// An SPL token transfer pulled out of a parsed instruction
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransfer {
    /// Source token account
    pub source: String,
    pub amount: TransferAmount,
}

/// Mint addresses initialized by the transaction's top-level instructions, in declaration order
pub fn mint_initializations(tx: &ParsedTransaction) -> Vec<String> {
    tx.instructions.iter().filter_map(mint_initialization).collect()
}

/// Mint address if this instruction initializes a mint
pub fn mint_initialization(ix: &ParsedInstruction) -> Option<String> {
    if !ix.is_token_program() {
        return None;
    }
    let kind = ix.instruction_type()?;
    if !MINT_INIT_TYPES.contains(&kind) {
        return None;
    }
    ix.info()?
        .get("mint")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Token transfer carried by this instruction, if any
pub fn token_transfer(ix: &ParsedInstruction) -> Option<TokenTransfer> {
    if !ix.is_token_program() {
        return None;
    }
    let info = ix.info()?;
    let source = info.get("source")?.as_str()?.to_string();

    let amount = match ix.instruction_type()? {
        "transferChecked" => TransferAmount::Ui(ui_amount(info.get("tokenAmount")?)?),
        "transfer" => TransferAmount::Raw(u64_field(info.get("amount")?)?),
        _ => return None,
    };

    Some(TokenTransfer { source, amount })
}

/// Interpret a jsonParsed account payload
pub fn parse_account(address: &str, program: &str, parsed: &Value) -> ParsedAccount {
    let kind = parsed.get("type").and_then(Value::as_str);
    let info = parsed.get("info");

    let account = match (kind, info) {
        (Some("mint"), Some(info)) => parse_mint(address, info).map(ParsedAccount::Mint),
        (Some("account"), Some(info)) => parse_token_account(address, info).map(ParsedAccount::Token),
        _ => None,
    };

    account.unwrap_or_else(|| ParsedAccount::Other {
        program: program.to_string(),
    })
}

fn parse_mint(address: &str, info: &Value) -> Option<MintAccount> {
    let supply = u64_field(info.get("supply")?)?;
    let decimals = u8::try_from(info.get("decimals")?.as_u64()?).ok()?;

    // Token-2022 mints may carry name/symbol in the metadata extension
    let metadata = info
        .get("extensions")
        .and_then(Value::as_array)
        .and_then(|exts| {
            exts.iter()
                .find(|e| e.get("extension").and_then(Value::as_str) == Some("tokenMetadata"))
        })
        .and_then(|e| e.get("state"));

    let text = |key: &str| {
        metadata
            .and_then(|m| m.get(key))
            .or_else(|| info.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(MintAccount {
        address: address.to_string(),
        supply,
        decimals,
        mint_authority: string_field(info, "mintAuthority"),
        freeze_authority: string_field(info, "freezeAuthority"),
        name: text("name"),
        symbol: text("symbol"),
    })
}

fn parse_token_account(address: &str, info: &Value) -> Option<TokenAccount> {
    Some(TokenAccount {
        address: address.to_string(),
        mint: info.get("mint")?.as_str()?.to_string(),
        owner: info.get("owner")?.as_str()?.to_string(),
        ui_amount: info.get("tokenAmount").and_then(ui_amount),
    })
}

/// Decimal-adjusted amount from a `UiTokenAmount` object
fn ui_amount(token_amount: &Value) -> Option<f64> {
    if let Some(ui) = token_amount.get("uiAmount").and_then(Value::as_f64) {
        return Some(ui);
    }
    if let Some(ui) = token_amount
        .get("uiAmountString")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<f64>().ok())
    {
        return Some(ui);
    }
    let raw = u64_field(token_amount.get("amount")?)?;
    let decimals = token_amount.get("decimals")?.as_u64()?;
    Some(raw as f64 / 10f64.powi(decimals as i32))
}

/// RPC encodes u64 amounts as strings, but be lenient about numbers too
fn u64_field(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn string_field(info: &Value, key: &str) -> Option<String> {
    info.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_ix(parsed: Value) -> ParsedInstruction {
        ParsedInstruction {
            program: "spl-token".into(),
            program_id: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".into(),
            parsed: Some(parsed),
        }
    }

    #[test]
    fn test_mint_initializations_in_order() {
        let tx = ParsedTransaction {
            signature: "sig".into(),
            instructions: vec![
                ParsedInstruction {
                    program: "system".into(),
                    program_id: "11111111111111111111111111111111".into(),
                    parsed: Some(json!({"type": "createAccount", "info": {"newAccount": "X"}})),
                },
                token_ix(json!({"type": "initializeMint", "info": {"mint": "MintA", "decimals": 6}})),
                token_ix(json!({"type": "initializeMint2", "info": {"mint": "MintB", "decimals": 9}})),
                token_ix(json!({"type": "initializeMint"})),
                token_ix(json!({"type": "mintTo", "info": {"mint": "MintA"}})),
            ],
            ..Default::default()
        };

        assert_eq!(mint_initializations(&tx), vec!["MintA".to_string(), "MintB".to_string()]);
    }

    #[test]
    fn test_mint_initialization_ignores_other_programs() {
        let ix = ParsedInstruction {
            program: "spl-memo".into(),
            program_id: "Memo".into(),
            parsed: Some(json!({"type": "initializeMint", "info": {"mint": "Fake"}})),
        };
        assert!(mint_initialization(&ix).is_none());
    }

    #[test]
    fn test_transfer_checked_uses_ui_amount() {
        let ix = token_ix(json!({
            "type": "transferChecked",
            "info": {
                "source": "SrcAcc",
                "destination": "DstAcc",
                "mint": "MintA",
                "authority": "Dev",
                "tokenAmount": {"amount": "1500000", "decimals": 6, "uiAmount": 1.5, "uiAmountString": "1.5"}
            }
        }));
        let transfer = token_transfer(&ix).unwrap();
        assert_eq!(transfer.source, "SrcAcc");
        assert_eq!(transfer.amount, TransferAmount::Ui(1.5));
    }

    #[test]
    fn test_plain_transfer_is_raw() {
        let ix = token_ix(json!({
            "type": "transfer",
            "info": {"source": "SrcAcc", "destination": "DstAcc", "authority": "Dev", "amount": "42000"}
        }));
        assert_eq!(token_transfer(&ix).unwrap().amount, TransferAmount::Raw(42_000));
    }

    #[test]
    fn test_non_transfer_is_ignored() {
        let ix = token_ix(json!({"type": "burn", "info": {"account": "A", "amount": "1"}}));
        assert!(token_transfer(&ix).is_none());

        let malformed = token_ix(json!({"type": "transfer", "info": {"source": "A", "amount": "lots"}}));
        assert!(token_transfer(&malformed).is_none());
    }

    #[test]
    fn test_parse_mint_with_metadata_extension() {
        let parsed = json!({
            "type": "mint",
            "info": {
                "decimals": 6,
                "supply": "1000000000000",
                "isInitialized": true,
                "mintAuthority": null,
                "freezeAuthority": "Freezer",
                "extensions": [
                    {"extension": "metadataPointer", "state": {}},
                    {"extension": "tokenMetadata", "state": {"name": "SuperAI Coin", "symbol": "SAI", "uri": ""}}
                ]
            }
        });

        let account = parse_account("MintA", "spl-token-2022", &parsed);
        let mint = account.as_mint().unwrap();
        assert_eq!(mint.supply, 1_000_000_000_000);
        assert_eq!(mint.decimals, 6);
        assert!(mint.mint_authority.is_none());
        assert_eq!(mint.freeze_authority.as_deref(), Some("Freezer"));
        assert_eq!(mint.name.as_deref(), Some("SuperAI Coin"));
        assert_eq!(mint.symbol.as_deref(), Some("SAI"));
    }

    #[test]
    fn test_parse_plain_mint_has_no_metadata() {
        let parsed = json!({"type": "mint", "info": {"decimals": 9, "supply": "5"}});
        let mint = parse_account("MintB", "spl-token", &parsed).as_mint().cloned().unwrap();
        assert!(mint.name.is_none());
        assert!(mint.symbol.is_none());
    }

    #[test]
    fn test_parse_token_account() {
        let parsed = json!({
            "type": "account",
            "info": {
                "mint": "MintA",
                "owner": "Dev",
                "state": "initialized",
                "tokenAmount": {"amount": "60000000000", "decimals": 6, "uiAmount": 60000.0, "uiAmountString": "60000"}
            }
        });
        let account = parse_account("DevAta", "spl-token", &parsed);
        let token = account.as_token().unwrap();
        assert_eq!(token.mint, "MintA");
        assert_eq!(token.owner, "Dev");
        assert!((token.ui_amount.unwrap() - 60_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_token_account_without_amount() {
        let parsed = json!({
            "type": "account",
            "info": {"mint": "MintA", "owner": "Dev", "state": "initialized"}
        });
        let account = parse_account("DevAta", "spl-token", &parsed);
        let token = account.as_token().unwrap();
        assert_eq!(token.owner, "Dev");
        assert_eq!(token.ui_amount, None);
    }

    #[test]
    fn test_ui_amount_falls_back_to_raw() {
        let amount = json!({"amount": "2500", "decimals": 3, "uiAmount": null});
        assert!((ui_amount(&amount).unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_unrecognized_account() {
        let parsed = json!({"type": "nonce", "info": {}});
        assert_eq!(
            parse_account("X", "nonce", &parsed),
            ParsedAccount::Other { program: "nonce".into() }
        );

        let broken_mint = json!({"type": "mint", "info": {"decimals": 6}});
        assert!(parse_account("X", "spl-token", &broken_mint).as_mint().is_none());
    }
}
