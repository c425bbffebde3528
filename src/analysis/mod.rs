//! Risk analysis of newly created mints
//!
//! - `creator`: creator balance and post-mint outflow
//! - `concentration`: top-10 concentration, holder estimate, narrative keywords
//! - `risk`: additive score and the show/suppress decision

pub mod concentration;
pub mod creator;
pub mod risk;
pub mod types;

use serde::{Deserialize, Serialize};

pub use concentration::{ConcentrationEvaluator, ConcentrationReport, NarrativeMatcher};
pub use creator::CreatorActivityAnalyzer;
pub use risk::{RiskEngine, RiskThresholds, ScoringWeights};
pub use types::{
    AlertDecision, CreatorActivity, CreatorActivityResult, CreatorFlag, HolderSnapshot,
    LookupCoverage, MintEvent, NarrativeFlag, Percent, ReasonCode, RiskAssessment,
};

/// Thresholds and limits for mint analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Creator signatures replayed per mint
    #[serde(default = "default_dev_lookback_limit")]
    pub dev_lookback_limit: usize,

    /// Creator holding above this share of supply flags DEV_IN
    #[serde(default = "default_dev_holding_limit_pct")]
    pub dev_holding_limit_pct: f64,

    /// Top-10 concentration above this suppresses the alert
    #[serde(default = "default_top10_limit_pct")]
    pub top10_limit_pct: f64,

    /// Holder estimate floor
    #[serde(default = "default_min_holders")]
    pub min_holders: usize,

    /// Minimum pool liquidity in SOL
    #[serde(default = "default_min_liquidity_sol")]
    pub min_liquidity_sol: f64,

    /// Case-insensitive keywords matched against name and symbol
    #[serde(default = "default_ai_keywords")]
    pub ai_keywords: Vec<String>,

    /// Concurrent chain lookups within one creator analysis
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
}

fn default_dev_lookback_limit() -> usize { 150 }
fn default_dev_holding_limit_pct() -> f64 { 5.0 }
fn default_top10_limit_pct() -> f64 { 20.0 }
fn default_min_holders() -> usize { 20 }
fn default_min_liquidity_sol() -> f64 { 3.0 }
fn default_lookup_concurrency() -> usize { 8 }

fn default_ai_keywords() -> Vec<String> {
    std::env::var("AI_KEYWORDS")
        .unwrap_or_else(|_| "AI,GPT,LLM,GenAI,Neural,Model,Agent".to_string())
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dev_lookback_limit: default_dev_lookback_limit(),
            dev_holding_limit_pct: default_dev_holding_limit_pct(),
            top10_limit_pct: default_top10_limit_pct(),
            min_holders: default_min_holders(),
            min_liquidity_sol: default_min_liquidity_sol(),
            ai_keywords: default_ai_keywords(),
            lookup_concurrency: default_lookup_concurrency(),
        }
    }
}

impl AnalysisConfig {
    pub fn thresholds(&self) -> RiskThresholds {
        RiskThresholds {
            top10_limit_pct: self.top10_limit_pct,
            min_holders: self.min_holders,
        }
    }
}
