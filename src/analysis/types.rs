//! Data model shared by the analysis pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::HolderBalance;

/// A percentage that may not be computable
///
/// Anything derived from total supply is `Unknown` when the supply could not be
/// resolved, instead of silently falling back to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Percent {
    Known(f64),
    #[default]
    Unknown,
}

impl Percent {
    /// `part / whole * 100`, unknown unless `whole` is a positive finite number
    pub fn of(part: f64, whole: Option<f64>) -> Self {
        match whole {
            Some(whole) if whole.is_finite() && whole > 0.0 && part.is_finite() => {
                Percent::Known(part / whole * 100.0)
            }
            _ => Percent::Unknown,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Percent::Known(v) => Some(v),
            Percent::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Percent::Known(_))
    }

    /// Strictly above `threshold`; never true when unknown
    pub fn exceeds(self, threshold: f64) -> bool {
        matches!(self, Percent::Known(v) if v > threshold)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percent::Known(v) => write!(f, "{:.3}%", v),
            Percent::Unknown => write!(f, "n/a"),
        }
    }
}

/// A newly observed mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintEvent {
    pub mint_address: String,
    /// Transaction that initialized the mint
    pub signature: String,
    pub slot: u64,
    pub discovered_at: DateTime<Utc>,
}

/// Largest holders of a mint at query time, largest first
pub type HolderSnapshot = Vec<HolderBalance>;

/// What the creator-activity walk managed to look at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupCoverage {
    /// Lookback limit asked for
    pub signatures_requested: usize,
    /// Signatures the node returned
    pub signatures_found: usize,
    pub transactions_scanned: usize,
    /// Transaction lookups that errored or timed out
    pub transactions_failed: usize,
    /// Transactions the node returned without a parsed body
    pub transactions_unavailable: usize,
    /// Transfer source lookups that errored
    pub accounts_failed: usize,
    /// Raw transfers that could not be scaled because mint decimals were unknown
    pub transfers_unscaled: usize,
    /// Creator balance lookup failed
    pub balance_lookup_failed: bool,
}

impl LookupCoverage {
    /// Every lookup succeeded
    pub fn is_complete(&self) -> bool {
        self.transactions_failed == 0
            && self.transactions_unavailable == 0
            && self.accounts_failed == 0
            && self.transfers_unscaled == 0
            && !self.balance_lookup_failed
    }
}

/// Creator balance and outflow for one mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorActivityResult {
    pub creator_address: String,
    /// Current decimal-adjusted balance across all creator token accounts for
    /// the mint, `None` when the lookup failed
    pub current_balance: Option<f64>,
    /// Decimal-adjusted amount moved out of creator-owned accounts
    pub cumulative_outflow: f64,
    /// Decimal-adjusted total supply, if resolved
    pub total_supply: Option<f64>,
    pub outflow_percent_of_supply: Percent,
    pub coverage: LookupCoverage,
}

impl CreatorActivityResult {
    /// Share of supply the creator currently holds
    pub fn holding_percent(&self) -> Percent {
        match self.current_balance {
            Some(balance) => Percent::of(balance, self.total_supply),
            None => Percent::Unknown,
        }
    }
}

/// Outcome of a creator-activity analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CreatorActivity {
    Completed(CreatorActivityResult),
    /// The analysis could not run at all (invalid address, history unavailable)
    Failed { creator_address: String, error: String },
}

impl CreatorActivity {
    pub fn ok(&self) -> bool {
        matches!(self, CreatorActivity::Completed(_))
    }

    pub fn result(&self) -> Option<&CreatorActivityResult> {
        match self {
            CreatorActivity::Completed(result) => Some(result),
            CreatorActivity::Failed { .. } => None,
        }
    }

    pub fn creator_address(&self) -> &str {
        match self {
            CreatorActivity::Completed(result) => &result.creator_address,
            CreatorActivity::Failed { creator_address, .. } => creator_address,
        }
    }

    /// Classify the creator's position against the holding limit
    pub fn flag(&self, holding_limit_pct: f64) -> CreatorFlag {
        match self.result().map(CreatorActivityResult::holding_percent) {
            Some(Percent::Known(pct)) if pct > holding_limit_pct => CreatorFlag::DevIn,
            Some(Percent::Known(_)) => CreatorFlag::DevOut,
            _ => CreatorFlag::Unknown,
        }
    }
}

/// Whether the creator still holds a meaningful position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreatorFlag {
    DevIn,
    DevOut,
    Unknown,
}

impl fmt::Display for CreatorFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreatorFlag::DevIn => write!(f, "DEV_IN"),
            CreatorFlag::DevOut => write!(f, "DEV_OUT"),
            CreatorFlag::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Narrative keyword match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NarrativeFlag {
    AiWarm,
    AiNone,
}

impl fmt::Display for NarrativeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeFlag::AiWarm => write!(f, "AI_WARM"),
            NarrativeFlag::AiNone => write!(f, "AI_NONE"),
        }
    }
}

/// Why an alert was suppressed
///
/// Declaration order is precedence order: when several conditions trigger,
/// the first one listed becomes the decision's reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Top10Concentration,
    DevIn,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::Top10Concentration => write!(f, "top10_concentration"),
            ReasonCode::DevIn => write!(f, "dev_in"),
        }
    }
}

/// Scored risk signals for one mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub mint: String,
    pub creator_flag: CreatorFlag,
    pub top10_concentration_percent: Percent,
    /// max(observed top-holder count, configured floor); not a true holder count
    pub holder_count_estimate: usize,
    pub narrative_flag: NarrativeFlag,
    /// Always within [1, 99]
    pub score: u8,
}

/// Final show/suppress outcome for one mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub mint: String,
    pub show: bool,
    /// Highest-precedence triggered reason
    pub reason_code: Option<ReasonCode>,
    /// Every triggered reason, in precedence order
    pub triggered_reasons: Vec<ReasonCode>,
    pub rendered_message: String,
}
