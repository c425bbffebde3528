//! Chain data types consumed by the scanner
//!
//! These are deliberately narrower than the RPC response types: only the
//! fields the pipeline reads survive the conversion.

use serde_json::Value;

/// Program names reported by the jsonParsed encoding for SPL token programs
pub const TOKEN_PROGRAM_NAMES: [&str; 2] = ["spl-token", "spl-token-2022"];

/// A single instruction as returned by the jsonParsed encoding
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInstruction {
    /// Program name ("spl-token", "system", ...), empty when the node could not decode it
    pub program: String,
    /// Program id (base58)
    pub program_id: String,
    /// Parsed payload (`{"type": ..., "info": {...}}`), `None` for partially decoded instructions
    pub parsed: Option<Value>,
}

impl ParsedInstruction {
    /// Is this instruction addressed to an SPL token program?
    pub fn is_token_program(&self) -> bool {
        TOKEN_PROGRAM_NAMES.contains(&self.program.as_str())
    }

    /// Instruction type, e.g. "initializeMint" or "transferChecked"
    pub fn instruction_type(&self) -> Option<&str> {
        self.parsed.as_ref()?.get("type")?.as_str()
    }

    /// The `info` object of the parsed payload
    pub fn info(&self) -> Option<&Value> {
        self.parsed.as_ref()?.get("info")
    }
}

/// A confirmed transaction reduced to its instructions
#[derive(Debug, Clone, Default)]
pub struct ParsedTransaction {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    /// Top-level instructions in declaration order
    pub instructions: Vec<ParsedInstruction>,
    /// Inner (CPI) instructions, flattened in execution order
    pub inner_instructions: Vec<ParsedInstruction>,
    /// Transaction executed with an error
    pub failed: bool,
}

/// One entry of the largest-holders list
#[derive(Debug, Clone, PartialEq)]
pub struct HolderBalance {
    /// Token account address
    pub address: String,
    /// Decimal-adjusted amount, `None` when the node omitted it
    pub ui_amount: Option<f64>,
}

/// Parsed SPL mint account
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MintAccount {
    pub address: String,
    /// Raw supply in base units
    pub supply: u64,
    pub decimals: u8,
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    /// Token name from on-chain metadata, when the mint carries it
    pub name: Option<String>,
    /// Token symbol from on-chain metadata, when the mint carries it
    pub symbol: Option<String>,
}

impl MintAccount {
    /// Convert a raw base-unit amount to a decimal-adjusted amount
    pub fn to_ui_amount(&self, raw: u64) -> f64 {
        raw as f64 / 10f64.powi(self.decimals as i32)
    }

    /// Decimal-adjusted total supply
    pub fn ui_supply(&self) -> f64 {
        self.to_ui_amount(self.supply)
    }

    /// Name and symbol joined for keyword matching, `None` without metadata
    pub fn name_and_symbol(&self) -> Option<String> {
        match (self.name.as_deref(), self.symbol.as_deref()) {
            (None, None) => None,
            (name, symbol) => Some(format!("{} {}", name.unwrap_or(""), symbol.unwrap_or(""))),
        }
    }
}

/// Parsed SPL token account
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAccount {
    pub address: String,
    pub mint: String,
    pub owner: String,
    /// Decimal-adjusted balance, `None` when the node omitted it
    pub ui_amount: Option<f64>,
}

/// Parsed account info
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAccount {
    Mint(MintAccount),
    Token(TokenAccount),
    /// Anything the scanner does not interpret
    Other { program: String },
}

impl ParsedAccount {
    pub fn as_mint(&self) -> Option<&MintAccount> {
        match self {
            ParsedAccount::Mint(mint) => Some(mint),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&TokenAccount> {
        match self {
            ParsedAccount::Token(account) => Some(account),
            _ => None,
        }
    }
}
