//! Risk scoring and the show/suppress decision
//!
//! The score is an additive heuristic, not a probability:
//! - Start from `baseline`
//! - Creator still holds more than the holding limit: `+creator_in`
//! - Top-10 concentration above threshold: `+top10`
//! - Holder estimate below the floor: `+low_holders`
//! - Narrative keyword match: `+narrative`
//!
//! The result is clamped to [1, 99]. Suppression is decided separately and only
//! looks at the creator flag and top-10 concentration.

use serde::{Deserialize, Serialize};

use crate::analysis::concentration::ConcentrationReport;
use crate::analysis::types::{
    AlertDecision, CreatorActivity, CreatorFlag, NarrativeFlag, Percent, ReasonCode, RiskAssessment,
};

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 99;
/// Largest magnitude a configured weight may have
pub const MAX_WEIGHT: i32 = 1000;

/// Additive score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_baseline")]
    pub baseline: i32,

    /// Creator flag is DEV_IN
    #[serde(default = "default_creator_in")]
    pub creator_in: i32,

    /// Top-10 concentration above threshold
    #[serde(default = "default_top10")]
    pub top10: i32,

    /// Holder estimate below the configured floor
    #[serde(default = "default_low_holders")]
    pub low_holders: i32,

    /// Narrative keyword match
    #[serde(default = "default_narrative")]
    pub narrative: i32,
}

fn default_baseline() -> i32 { 50 }
fn default_creator_in() -> i32 { 30 }
fn default_top10() -> i32 { 20 }
fn default_low_holders() -> i32 { 15 }
fn default_narrative() -> i32 { 10 }

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            creator_in: default_creator_in(),
            top10: default_top10(),
            low_holders: default_low_holders(),
            narrative: default_narrative(),
        }
    }
}

/// Thresholds the scorer compares against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    pub top10_limit_pct: f64,
    pub min_holders: usize,
}

/// Bounded additive risk score
pub fn risk_score(
    creator_flag: CreatorFlag,
    top10: Percent,
    holder_count_estimate: usize,
    narrative_flag: NarrativeFlag,
    thresholds: &RiskThresholds,
    weights: &ScoringWeights,
) -> u8 {
    let mut score = weights.baseline;
    if creator_flag == CreatorFlag::DevIn {
        score = score.saturating_add(weights.creator_in);
    }
    if top10.exceeds(thresholds.top10_limit_pct) {
        score = score.saturating_add(weights.top10);
    }
    if holder_count_estimate < thresholds.min_holders {
        score = score.saturating_add(weights.low_holders);
    }
    if narrative_flag == NarrativeFlag::AiWarm {
        score = score.saturating_add(weights.narrative);
    }
    score.clamp(MIN_SCORE, MAX_SCORE) as u8
}

/// Scores mints and decides whether to alert
#[derive(Debug, Clone)]
pub struct RiskEngine {
    thresholds: RiskThresholds,
    weights: ScoringWeights,
}

impl RiskEngine {
    pub fn new(thresholds: RiskThresholds, weights: ScoringWeights) -> Self {
        Self { thresholds, weights }
    }

    pub fn assess(&self, mint: &str, creator_flag: CreatorFlag, signals: &ConcentrationReport) -> RiskAssessment {
        RiskAssessment {
            mint: mint.to_string(),
            creator_flag,
            top10_concentration_percent: signals.top10,
            holder_count_estimate: signals.holder_count_estimate,
            narrative_flag: signals.narrative_flag,
            score: risk_score(
                creator_flag,
                signals.top10,
                signals.holder_count_estimate,
                signals.narrative_flag,
                &self.thresholds,
                &self.weights,
            ),
        }
    }

    /// Conditions that suppress the alert, highest precedence first
    pub fn triggered_reasons(&self, assessment: &RiskAssessment) -> Vec<ReasonCode> {
        let mut reasons = Vec::new();
        if assessment
            .top10_concentration_percent
            .exceeds(self.thresholds.top10_limit_pct)
        {
            reasons.push(ReasonCode::Top10Concentration);
        }
        if assessment.creator_flag == CreatorFlag::DevIn {
            reasons.push(ReasonCode::DevIn);
        }
        reasons.sort();
        reasons
    }

    pub fn decide(&self, assessment: &RiskAssessment, creator: Option<&CreatorActivity>) -> AlertDecision {
        let triggered_reasons = self.triggered_reasons(assessment);
        let reason_code = triggered_reasons.first().copied();
        let show = reason_code.is_none();

        let rendered_message = match reason_code {
            None => render_alert(assessment, creator),
            Some(reason) => render_ignored(&assessment.mint, reason),
        };

        AlertDecision {
            mint: assessment.mint.clone(),
            show,
            reason_code,
            triggered_reasons,
            rendered_message,
        }
    }
}

/// HTML alert for a shown mint
pub fn render_alert(assessment: &RiskAssessment, creator: Option<&CreatorActivity>) -> String {
    let result = creator.and_then(CreatorActivity::result);
    let moved = result
        .map(|r| format_amount(r.cumulative_outflow))
        .unwrap_or_else(|| "n/a".to_string());
    let moved_pct = result
        .map(|r| r.outflow_percent_of_supply)
        .unwrap_or_default();

    format!(
        "<b>New Token Detected</b>\n\
         Mint: <code>{mint}</code>\n\
         Dev: {flag} (moved: {moved} ({moved_pct}))\n\
         Top10%: {top10}\n\
         Holders(estimate): {holders}\n\
         Risk: {score}%\n\
         Narrative: {narrative}\n\
         \n\
         Copy contract: {mint}",
        mint = assessment.mint,
        flag = assessment.creator_flag,
        moved = moved,
        moved_pct = moved_pct,
        top10 = assessment.top10_concentration_percent,
        holders = assessment.holder_count_estimate,
        score = assessment.score,
        narrative = assessment.narrative_flag,
    )
}

/// Audit line for a suppressed mint
pub fn render_ignored(mint: &str, reason: ReasonCode) -> String {
    format!("IGNORED {} reason={}", mint, reason)
}

fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.6}", amount);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
