//! Per-mint evaluation: fetch, analyze, score, decide

use std::sync::Arc;
use tracing::{debug, info};

use crate::analysis::{
    AlertDecision, AnalysisConfig, ConcentrationEvaluator, CreatorActivity, CreatorActivityAnalyzer,
    CreatorFlag, HolderSnapshot, MintEvent, RiskAssessment, RiskEngine, ScoringWeights,
};
use crate::chain::{ChainDataClient, ParsedAccount};
use crate::error::Result;

/// Everything learned about one mint
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub event: MintEvent,
    /// `None` when no holder could stand in for the creator, or the top
    /// holder's owner could not be resolved
    pub creator: Option<CreatorActivity>,
    pub assessment: RiskAssessment,
    pub decision: AlertDecision,
}

/// Runs the analysis pipeline for a single mint
pub struct MintEvaluator {
    client: Arc<dyn ChainDataClient>,
    creator: CreatorActivityAnalyzer,
    concentration: ConcentrationEvaluator,
    risk: RiskEngine,
    dev_holding_limit_pct: f64,
}

impl MintEvaluator {
    pub fn new(client: Arc<dyn ChainDataClient>, config: &AnalysisConfig, weights: ScoringWeights) -> Result<Self> {
        Ok(Self {
            creator: CreatorActivityAnalyzer::new(
                client.clone(),
                config.dev_lookback_limit,
                config.lookup_concurrency,
            ),
            concentration: ConcentrationEvaluator::new(config.min_holders, &config.ai_keywords)?,
            risk: RiskEngine::new(config.thresholds(), weights),
            dev_holding_limit_pct: config.dev_holding_limit_pct,
            client,
        })
    }

    pub async fn evaluate(&self, event: MintEvent) -> Evaluation {
        let mint = event.mint_address.as_str();

        let (mint_account, holders) = tokio::join!(
            self.client.parsed_account_info(mint),
            self.client.largest_holders(mint)
        );

        let mint_account = match mint_account {
            Ok(account) => account.and_then(|a| a.as_mint().cloned()),
            Err(e) => {
                debug!(mint = %mint, error = %e, "Mint account lookup failed");
                None
            }
        };
        let holders: HolderSnapshot = match holders {
            Ok(holders) => holders,
            Err(e) => {
                debug!(mint = %mint, error = %e, "Largest holders lookup failed");
                Vec::new()
            }
        };

        // The largest holder stands in for the creator
        let candidate = match holders.first() {
            Some(top) => self.resolve_owner(&top.address).await,
            None => None,
        };
        let creator = match candidate {
            Some(candidate) => Some(self.creator.analyze(mint, mint_account.as_ref(), &candidate).await),
            None => None,
        };
        let creator_flag = creator
            .as_ref()
            .map(|c| c.flag(self.dev_holding_limit_pct))
            .unwrap_or(CreatorFlag::Unknown);

        let signals = self.concentration.evaluate(&holders, mint_account.as_ref());
        let assessment = self.risk.assess(mint, creator_flag, &signals);
        let decision = self.risk.decide(&assessment, creator.as_ref());

        info!(
            mint = %mint,
            creator = creator.as_ref().map(CreatorActivity::creator_address).unwrap_or("-"),
            creator_flag = %assessment.creator_flag,
            top10 = %assessment.top10_concentration_percent,
            holders = assessment.holder_count_estimate,
            narrative = %assessment.narrative_flag,
            score = assessment.score,
            show = decision.show,
            "Mint evaluated"
        );

        Evaluation {
            event,
            creator,
            assessment,
            decision,
        }
    }

    /// Owner of a token account, or the address itself when it is not one;
    /// `None` when the lookup failed
    async fn resolve_owner(&self, token_account: &str) -> Option<String> {
        match self.client.parsed_account_info(token_account).await {
            Ok(Some(ParsedAccount::Token(account))) => Some(account.owner),
            Ok(_) => Some(token_account.to_string()),
            Err(e) => {
                debug!(account = %token_account, error = %e, "Holder owner lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Percent, ReasonCode};
    use crate::chain::mock::MockChainClient;
    use chrono::Utc;

    const MINT: &str = "So11111111111111111111111111111111111111112";
    const DEV: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const DEV_ATA: &str = "DevAta1111111111111111111111111111111111111";

    fn event() -> MintEvent {
        MintEvent {
            mint_address: MINT.to_string(),
            signature: "sig".into(),
            slot: 1,
            discovered_at: Utc::now(),
        }
    }

    fn evaluator(mock: MockChainClient) -> (Arc<MockChainClient>, MintEvaluator) {
        let mock = Arc::new(mock);
        let evaluator =
            MintEvaluator::new(mock.clone(), &AnalysisConfig::default(), ScoringWeights::default()).unwrap();
        (mock, evaluator)
    }

    #[tokio::test]
    async fn test_creator_holding_suppresses() {
        // 60,000 of 1,000,000 held by the creator; top-10 6%
        let mock = MockChainClient::new()
            .with_mint(MINT, 1_000_000_000_000, 6, None)
            .with_token_account(DEV_ATA, MINT, DEV, 60_000.0)
            .with_holders(MINT, &[(DEV_ATA, 60_000.0)]);

        let (mock, evaluator) = evaluator(mock);
        let evaluation = evaluator.evaluate(event()).await;

        assert_eq!(evaluation.creator.as_ref().unwrap().creator_address(), DEV);
        assert_eq!(evaluation.assessment.creator_flag, CreatorFlag::DevIn);
        assert_eq!(evaluation.assessment.top10_concentration_percent, Percent::Known(6.0));
        assert!(!evaluation.decision.show);
        assert_eq!(evaluation.decision.reason_code, Some(ReasonCode::DevIn));
        assert_eq!(evaluation.assessment.score, 80);
        assert_eq!(mock.call_count(&format!("signatures:{}", DEV)), 1);
    }

    #[tokio::test]
    async fn test_no_holders_means_unknown_creator() {
        let mock = MockChainClient::new().with_mint(MINT, 1_000_000_000_000, 6, None);
        let (mock, evaluator) = evaluator(mock);

        let evaluation = evaluator.evaluate(event()).await;
        assert!(evaluation.creator.is_none());
        assert_eq!(evaluation.assessment.creator_flag, CreatorFlag::Unknown);
        assert_eq!(evaluation.assessment.top10_concentration_percent, Percent::Unknown);
        assert!(evaluation.decision.show);
        assert_eq!(mock.call_count("signatures"), 0);
    }

    #[tokio::test]
    async fn test_failed_creator_analysis_still_decides() {
        let mock = MockChainClient::new()
            .with_mint(MINT, 1_000_000_000_000, 6, Some("Agent Smith"))
            .with_token_account(DEV_ATA, MINT, DEV, 1_000.0)
            .with_holders(MINT, &[(DEV_ATA, 1_000.0)])
            .failing_on(DEV);

        let (_, evaluator) = evaluator(mock);
        let evaluation = evaluator.evaluate(event()).await;

        assert!(!evaluation.creator.as_ref().unwrap().ok());
        assert_eq!(evaluation.assessment.creator_flag, CreatorFlag::Unknown);
        assert!(evaluation.decision.show);
        assert_eq!(evaluation.assessment.score, 60);
        assert!(evaluation.decision.rendered_message.contains("Narrative: AI_WARM"));
    }

    #[tokio::test]
    async fn test_owner_lookup_failure_leaves_creator_unknown() {
        let mock = MockChainClient::new()
            .with_mint(MINT, 1_000_000_000_000, 6, None)
            .with_token_account(DEV_ATA, MINT, DEV, 600_000.0)
            .with_holders(MINT, &[(DEV_ATA, 600_000.0)])
            .failing_on(&format!("account:{}", DEV_ATA));

        let (mock, evaluator) = evaluator(mock);
        let evaluation = evaluator.evaluate(event()).await;

        assert!(evaluation.creator.is_none());
        assert_eq!(evaluation.assessment.creator_flag, CreatorFlag::Unknown);
        assert_eq!(mock.call_count(&format!("token_accounts:{}", DEV_ATA)), 0);
        assert_eq!(mock.call_count("signatures:"), 0);
        // Top-10 still suppresses on its own
        assert_eq!(evaluation.decision.reason_code, Some(ReasonCode::Top10Concentration));
    }

    #[tokio::test]
    async fn test_creator_balance_failure_does_not_read_as_dev_out() {
        let mock = MockChainClient::new()
            .with_mint(MINT, 1_000_000_000_000, 6, None)
            .with_token_account(DEV_ATA, MINT, DEV, 40_000.0)
            .with_holders(MINT, &[(DEV_ATA, 40_000.0)])
            .failing_on(&format!("token_accounts:{}", DEV));

        let (_, evaluator) = evaluator(mock);
        let evaluation = evaluator.evaluate(event()).await;

        assert!(evaluation.creator.as_ref().unwrap().ok());
        assert_eq!(evaluation.assessment.creator_flag, CreatorFlag::Unknown);
        assert!(evaluation.decision.rendered_message.contains("Dev: UNKNOWN"));
    }

    #[tokio::test]
    async fn test_mint_account_fetched_once() {
        let mock = MockChainClient::new()
            .with_mint(MINT, 1_000_000_000_000, 6, None)
            .with_token_account(DEV_ATA, MINT, DEV, 60_000.0)
            .with_holders(MINT, &[(DEV_ATA, 60_000.0)]);

        let (mock, evaluator) = evaluator(mock);
        let evaluation = evaluator.evaluate(event()).await;

        assert_eq!(mock.call_count(&format!("account:{}", MINT)), 1);
        let creator = evaluation.creator.unwrap();
        assert_eq!(creator.result().unwrap().total_supply, Some(1_000_000.0));
    }

    #[tokio::test]
    async fn test_holder_that_is_not_a_token_account_is_used_directly() {
        let mock = MockChainClient::new()
            .with_mint(MINT, 1_000_000_000_000, 6, None)
            .with_holders(MINT, &[(DEV, 10.0)]);

        let (_, evaluator) = evaluator(mock);
        let evaluation = evaluator.evaluate(event()).await;
        assert_eq!(evaluation.creator.unwrap().creator_address(), DEV);
    }
}
