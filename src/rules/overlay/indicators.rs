use crate::domain::{Action, Evidence, RuleParams, Transaction};
use crate::rules::traits::{Draft, OverlayRule};

/// Risk-indicator tally rule.
///
/// Counts independent risk signals, noting each one, then escalates ALLOW to
/// VERIFY at `verify_count` indicators, or VERIFY to BLOCK at `block_count`.
/// The two escalations are exclusive: an ALLOW escalated here is not
/// escalated a second time in the same pass.
#[derive(Debug)]
pub struct RiskIndicatorRule {
    id: String,
    distant_location_km: f64,
    high_frequency_24h: u32,
    high_risk_receiver_reports: u32,
    verify_count: usize,
    block_count: usize,
}

impl RiskIndicatorRule {
    pub fn new(id: String, params: &RuleParams) -> Self {
        RiskIndicatorRule {
            id,
            distant_location_km: params.distant_location_km,
            high_frequency_24h: params.high_frequency_24h,
            high_risk_receiver_reports: params.high_risk_receiver_reports,
            verify_count: params.indicators_to_verify,
            block_count: params.indicators_to_block,
        }
    }

    /// Indicators present on a transaction, as (reason, evidence) pairs.
    fn indicators(&self, tx: &Transaction) -> Vec<(&'static str, Evidence)> {
        let signals = &tx.signals;
        let mut found = Vec::with_capacity(5);

        if signals.is_unusual_hour == Some(true) {
            found.push((
                "Unusual transaction hour",
                Evidence::new(&self.id, "is_unusual_hour", tx.hour.to_string()),
            ));
        }

        if tx.device_mismatch() {
            found.push((
                "New/different device",
                Evidence::new(&self.id, "device_id", tx.device_id.as_str()),
            ));
        }

        if let Some(distance) = signals.geo_distance_from_last_txn {
            if distance > self.distant_location_km {
                found.push((
                    "Distant location",
                    Evidence::with_limit(
                        &self.id,
                        "geo_distance_from_last_txn",
                        distance.to_string(),
                        self.distant_location_km.to_string(),
                    ),
                ));
            }
        }

        if let Some(frequency) = signals.transaction_frequency_last_24h {
            if frequency > self.high_frequency_24h {
                found.push((
                    "High transaction frequency",
                    Evidence::with_limit(
                        &self.id,
                        "transaction_frequency_last_24h",
                        frequency.to_string(),
                        self.high_frequency_24h.to_string(),
                    ),
                ));
            }
        }

        if let Some(reports) = signals.receiver_fraud_reports {
            if reports > self.high_risk_receiver_reports {
                found.push((
                    "High-risk receiver",
                    Evidence::with_limit(
                        &self.id,
                        "receiver_fraud_reports",
                        reports.to_string(),
                        self.high_risk_receiver_reports.to_string(),
                    ),
                ));
            }
        }

        found
    }
}

impl OverlayRule for RiskIndicatorRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, draft: Draft, tx: &Transaction) -> Draft {
        let indicators = self.indicators(tx);
        let count = indicators.len();

        let mut draft = indicators
            .into_iter()
            .fold(draft, |draft, (reason, evidence)| draft.note(reason, evidence));

        if count >= self.verify_count && draft.action == Action::Allow {
            draft = draft.change(
                Action::Verify,
                format!("Multiple risk indicators ({count})"),
                Evidence::with_limit(
                    &self.id,
                    "indicator_count",
                    count.to_string(),
                    self.verify_count.to_string(),
                ),
            );
        } else if count >= self.block_count && draft.action == Action::Verify {
            draft = draft.change(
                Action::Block,
                format!("Too many risk indicators ({count})"),
                Evidence::with_limit(
                    &self.id,
                    "indicator_count",
                    count.to_string(),
                    self.block_count.to_string(),
                ),
            );
        }

        draft
    }
}
