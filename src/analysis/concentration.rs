//! Holder concentration and narrative signals

use regex::{Regex, RegexBuilder};

use crate::analysis::types::{NarrativeFlag, Percent};
use crate::chain::{HolderBalance, MintAccount};
use crate::error::{Error, Result};

/// Holders counted toward the concentration figure
pub const TOP_HOLDERS: usize = 10;

/// Share of supply held by the `TOP_HOLDERS` largest accounts
///
/// Holders with an unknown amount contribute nothing. An empty list or an
/// unresolved supply yields `Unknown`.
pub fn top10_concentration(holders: &[HolderBalance], supply: Option<f64>) -> Percent {
    if holders.is_empty() {
        return Percent::Unknown;
    }
    let held: f64 = holders
        .iter()
        .take(TOP_HOLDERS)
        .filter_map(|h| h.ui_amount)
        .filter(|a| a.is_finite())
        .sum();
    Percent::of(held, supply)
}

/// Lower-bounded holder estimate
///
/// Largest-holder lists are capped by the node, so the observed length is only
/// a lower bound on the real holder count. Never below `floor`.
pub fn holder_count_estimate(holders: &[HolderBalance], floor: usize) -> usize {
    holders.len().max(floor)
}

/// Case-insensitive keyword matcher over token name and symbol
#[derive(Debug, Clone)]
pub struct NarrativeMatcher {
    pattern: Option<Regex>,
}

impl NarrativeMatcher {
    pub fn new(keywords: &[String]) -> Result<Self> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Config(format!("Invalid narrative keywords: {}", e)))?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn flag(&self, text: Option<&str>) -> NarrativeFlag {
        match (&self.pattern, text) {
            (Some(pattern), Some(text)) if pattern.is_match(text) => NarrativeFlag::AiWarm,
            _ => NarrativeFlag::AiNone,
        }
    }
}

/// Concentration signals for one mint
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationReport {
    pub top10: Percent,
    pub holder_count_estimate: usize,
    pub narrative_flag: NarrativeFlag,
}

/// Computes [`ConcentrationReport`]s
#[derive(Debug, Clone)]
pub struct ConcentrationEvaluator {
    min_holders: usize,
    narrative: NarrativeMatcher,
}

impl ConcentrationEvaluator {
    pub fn new(min_holders: usize, keywords: &[String]) -> Result<Self> {
        Ok(Self {
            min_holders,
            narrative: NarrativeMatcher::new(keywords)?,
        })
    }

    pub fn evaluate(&self, holders: &[HolderBalance], mint: Option<&MintAccount>) -> ConcentrationReport {
        let supply = mint.map(MintAccount::ui_supply);
        let label = mint.and_then(MintAccount::name_and_symbol);

        ConcentrationReport {
            top10: top10_concentration(holders, supply),
            holder_count_estimate: holder_count_estimate(holders, self.min_holders),
            narrative_flag: self.narrative.flag(label.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holders(amounts: &[f64]) -> Vec<HolderBalance> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| HolderBalance {
                address: format!("Holder{}", i),
                ui_amount: Some(*a),
            })
            .collect()
    }

    fn keywords() -> Vec<String> {
        ["AI", "GPT", "LLM", "GenAI", "Neural", "Model", "Agent"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_top10_concentration() {
        let top = top10_concentration(&holders(&[150_000.0, 100_000.0]), Some(1_000_000.0));
        assert_eq!(top, Percent::Known(25.0));
    }

    #[test]
    fn test_top10_only_counts_ten() {
        let list = holders(&[1.0; 15]);
        assert_eq!(top10_concentration(&list, Some(100.0)), Percent::Known(10.0));
    }

    #[test]
    fn test_top10_unknown_without_supply_or_holders() {
        assert_eq!(top10_concentration(&holders(&[5.0]), None), Percent::Unknown);
        assert_eq!(top10_concentration(&holders(&[5.0]), Some(0.0)), Percent::Unknown);
        assert_eq!(top10_concentration(&[], Some(100.0)), Percent::Unknown);
    }

    #[test]
    fn test_top10_skips_unknown_amounts() {
        let mut list = holders(&[30.0]);
        list.push(HolderBalance {
            address: "Blank".into(),
            ui_amount: None,
        });
        assert_eq!(top10_concentration(&list, Some(100.0)), Percent::Known(30.0));
    }

    #[test]
    fn test_holder_estimate_floor() {
        assert_eq!(holder_count_estimate(&holders(&[1.0; 3]), 20), 20);
        assert_eq!(holder_count_estimate(&holders(&[1.0; 25]), 20), 25);
    }

    #[test]
    fn test_narrative_match() {
        let matcher = NarrativeMatcher::new(&keywords()).unwrap();
        assert_eq!(matcher.flag(Some("SuperAI Coin")), NarrativeFlag::AiWarm);
        assert_eq!(matcher.flag(Some("chatgpt inu")), NarrativeFlag::AiWarm);
        assert_eq!(matcher.flag(Some("Doggo")), NarrativeFlag::AiNone);
        assert_eq!(matcher.flag(None), NarrativeFlag::AiNone);
    }

    #[test]
    fn test_narrative_keywords_are_literal() {
        let matcher = NarrativeMatcher::new(&["a.b".to_string(), "  ".to_string()]).unwrap();
        assert_eq!(matcher.flag(Some("axb")), NarrativeFlag::AiNone);
        assert_eq!(matcher.flag(Some("A.B token")), NarrativeFlag::AiWarm);

        let empty = NarrativeMatcher::new(&[]).unwrap();
        assert_eq!(empty.flag(Some("anything")), NarrativeFlag::AiNone);
    }

    #[test]
    fn test_evaluate_uses_mint_metadata() {
        let evaluator = ConcentrationEvaluator::new(20, &keywords()).unwrap();
        let mint = MintAccount {
            address: "MintA".into(),
            supply: 1_000_000_000_000,
            decimals: 6,
            name: Some("Neural Frog".into()),
            symbol: Some("NFROG".into()),
            ..Default::default()
        };

        let report = evaluator.evaluate(&holders(&[250_000.0]), Some(&mint));
        assert_eq!(report.top10, Percent::Known(25.0));
        assert_eq!(report.holder_count_estimate, 20);
        assert_eq!(report.narrative_flag, NarrativeFlag::AiWarm);

        let report = evaluator.evaluate(&holders(&[250_000.0]), None);
        assert_eq!(report.top10, Percent::Unknown);
        assert_eq!(report.narrative_flag, NarrativeFlag::AiNone);
    }
}
