use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::thresholds::round_to;
use crate::domain::{DecisionId, DecisionRecord, ThresholdUpdate, Transaction};
use crate::error::{DecisionError, InvalidThresholdError};

use super::store::{PolicySnapshot, ThresholdInfo, ThresholdStore};

/// Turns a fraud score, plus optional transaction context, into a decision.
///
/// The engine holds no state of its own; every call reads one snapshot from
/// the shared [`ThresholdStore`] and uses it throughout.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    store: Arc<ThresholdStore>,
}

impl DecisionEngine {
    pub fn new(store: Arc<ThresholdStore>) -> Self {
        DecisionEngine { store }
    }

    /// Decide on a score in [0, 1].
    ///
    /// Without context only the threshold comparison applies. With context
    /// the business-rule overlay runs on top of the base action.
    pub fn make_decision(
        &self,
        score: f64,
        context: Option<&Transaction>,
    ) -> Result<DecisionRecord, DecisionError> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(DecisionError::InvalidScore(score));
        }

        let snapshot = self.store.snapshot();
        let record = decide(&snapshot, score, context);

        info!(
            transaction_id = context.map(|tx| tx.transaction_id.as_str()).unwrap_or("unknown"),
            decision_id = %record.decision_id.0,
            action = %record.action,
            score = record.score,
            risk_level = %record.risk_level,
            confidence = record.confidence,
            revision = record.threshold_revision,
            "Decision made"
        );

        Ok(record)
    }

    /// Apply a partial threshold update. Rejected updates change nothing.
    pub fn update_thresholds(
        &self,
        update: &ThresholdUpdate,
    ) -> Result<Arc<PolicySnapshot>, InvalidThresholdError> {
        self.store.update_thresholds(update)
    }

    /// Current thresholds and risk bands.
    pub fn get_threshold_info(&self) -> ThresholdInfo {
        ThresholdInfo::from(self.store.snapshot().as_ref())
    }

    pub fn store(&self) -> &Arc<ThresholdStore> {
        &self.store
    }
}

fn decide(snapshot: &PolicySnapshot, score: f64, context: Option<&Transaction>) -> DecisionRecord {
    let config = &snapshot.config;
    let base = config.base_action(score);

    let mut reasoning = vec![format!("Fraud score: {score:.4}")];

    let (action, evidence) = match context {
        None => {
            reasoning.push(format!("Base action: {base}"));
            (base, Vec::new())
        }
        Some(tx) => {
            let draft = snapshot.rules.apply(base, tx);
            reasoning.extend(draft.reasoning);
            reasoning.push(format!("Final action: {}", draft.action));
            (draft.action, draft.evidence)
        }
    };

    DecisionRecord {
        decision_id: DecisionId::new(),
        score: round_to(score, 4),
        risk_level: config.risk_level(score),
        action,
        reasoning,
        confidence: config.confidence(score),
        timestamp: Utc::now(),
        evidence,
        policy_version: snapshot.policy_version.clone(),
        threshold_revision: snapshot.revision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, RiskLevel, RiskSignals, UserTier};
    use rust_decimal::Decimal;

    fn engine() -> DecisionEngine {
        DecisionEngine::new(Arc::new(ThresholdStore::default()))
    }

    /// Sender history that trips no overlay on its own.
    fn known_signals() -> RiskSignals {
        RiskSignals {
            avg_amount_last_week: Some(Decimal::new(1000, 0)),
            preferred_device: Some("device_000".to_string()),
            ..Default::default()
        }
    }

    fn quiet_tx(amount: i64, hour: u8) -> Transaction {
        Transaction::new("S1", "R1", Decimal::new(amount, 0), hour).with_signals(known_signals())
    }

    #[test]
    fn test_no_context_low_score() {
        let record = engine().make_decision(0.2, None).unwrap();

        assert_eq!(record.action, Action::Allow);
        assert_eq!(record.risk_level, RiskLevel::Low);
        assert_eq!(
            record.reasoning,
            vec!["Fraud score: 0.2000".to_string(), "Base action: ALLOW".to_string()]
        );
        assert!(record.evidence.is_empty());
        assert_eq!(record.policy_version, "builtin");
        assert_eq!(record.threshold_revision, 1);
    }

    #[test]
    fn test_high_score_blocks() {
        let record = engine().make_decision(0.75, None).unwrap();

        assert_eq!(record.action, Action::Block);
        assert_eq!(record.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_score_of_one_is_high() {
        let record = engine().make_decision(1.0, None).unwrap();

        assert_eq!(record.action, Action::Block);
        assert_eq!(record.risk_level, RiskLevel::High);
        assert_eq!(record.confidence, 1.0);
    }

    #[test]
    fn test_invalid_scores_rejected() {
        let engine = engine();

        for score in [-0.1, 1.0001, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = engine.make_decision(score, None);
            assert!(
                matches!(result, Err(DecisionError::InvalidScore(_))),
                "score {score}"
            );
        }
    }

    #[test]
    fn test_base_action_matches_bands() {
        let engine = engine();

        for step in 0..=100 {
            let score = step as f64 / 100.0;
            let record = engine.make_decision(score, None).unwrap();
            let expected = if score < 0.4 {
                (Action::Allow, RiskLevel::Low)
            } else if score < 0.7 {
                (Action::Verify, RiskLevel::Medium)
            } else {
                (Action::Block, RiskLevel::High)
            };
            assert_eq!((record.action, record.risk_level), expected, "score {score}");
        }
    }

    #[test]
    fn test_high_amount_overlay() {
        let tx = quiet_tx(10000, 14);

        let record = engine().make_decision(0.3, Some(&tx)).unwrap();

        assert_eq!(record.action, Action::Verify);
        assert_eq!(record.risk_level, RiskLevel::Low);
        assert_eq!(
            record.reasoning,
            vec![
                "Fraud score: 0.3000".to_string(),
                "High amount transaction (>5x average)".to_string(),
                "Final action: VERIFY".to_string(),
            ]
        );
        assert!(record.has_evidence());
    }

    #[test]
    fn test_indicators_block_and_vip_downgrade() {
        let signals = RiskSignals {
            is_unusual_hour: Some(true),
            device_mismatch: Some(true),
            geo_distance_from_last_txn: Some(250.0),
            transaction_frequency_last_24h: Some(15),
            ..Default::default()
        };
        let tx = quiet_tx(3000, 14).with_signals(signals.clone());

        let record = engine().make_decision(0.5, Some(&tx)).unwrap();
        assert_eq!(record.action, Action::Block);
        assert_eq!(
            record.reasoning.last().map(String::as_str),
            Some("Final action: BLOCK")
        );

        let vip = tx.with_signals(RiskSignals {
            user_type: Some(UserTier::Vip),
            ..signals
        });
        let record = engine().make_decision(0.5, Some(&vip)).unwrap();
        assert_eq!(record.action, Action::Verify);
        assert!(record
            .reasoning
            .contains(&"VIP user - downgraded to verification".to_string()));
    }

    #[test]
    fn test_vip_downgrades_base_block() {
        let tx = quiet_tx(3000, 14).with_signals(RiskSignals {
            user_type: Some(UserTier::Vip),
            ..known_signals()
        });

        let record = engine().make_decision(0.9, Some(&tx)).unwrap();
        assert_eq!(record.action, Action::Verify);
        assert_eq!(record.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_micro_night_overlay() {
        let record = engine().make_decision(0.1, Some(&quiet_tx(20, 3))).unwrap();

        assert_eq!(record.action, Action::Verify);
        assert_eq!(record.reasoning[1], "Micro transaction during night hours");
    }

    #[test]
    fn test_score_rounding() {
        let record = engine().make_decision(0.123456, None).unwrap();

        assert_eq!(record.score, 0.1235);
        assert_eq!(record.reasoning[0], "Fraud score: 0.1235");
    }

    #[test]
    fn test_decisions_follow_threshold_updates() {
        let engine = engine();

        assert_eq!(engine.make_decision(0.35, None).unwrap().action, Action::Allow);

        engine
            .update_thresholds(&ThresholdUpdate::new(Some(0.3), None))
            .unwrap();

        let record = engine.make_decision(0.35, None).unwrap();
        assert_eq!(record.action, Action::Verify);
        assert_eq!(record.threshold_revision, 2);
    }

    #[test]
    fn test_rejected_update_keeps_thresholds() {
        let engine = engine();

        let result = engine.update_thresholds(&ThresholdUpdate::new(Some(0.8), Some(0.3)));
        assert!(result.is_err());

        let info = engine.get_threshold_info();
        assert_eq!(info.thresholds.allow, 0.4);
        assert_eq!(info.thresholds.block, 0.7);
        assert_eq!(info.risk_levels.len(), 3);
    }
}
