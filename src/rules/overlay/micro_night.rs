use rust_decimal::Decimal;

use crate::domain::{in_hour_window, Action, Evidence, RuleParams, Transaction};
use crate::rules::traits::{Draft, OverlayRule};

/// Micro-transaction-at-night rule.
///
/// Tiny payments in the night window are a common card-testing pattern.
#[derive(Debug)]
pub struct MicroNightRule {
    id: String,
    max_amount: Decimal,
    night_start_hour: u8,
    night_end_hour: u8,
}

impl MicroNightRule {
    pub fn new(id: String, params: &RuleParams) -> Self {
        MicroNightRule {
            id,
            max_amount: params.micro_amount,
            night_start_hour: params.night_start_hour,
            night_end_hour: params.night_end_hour,
        }
    }
}

impl OverlayRule for MicroNightRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, draft: Draft, tx: &Transaction) -> Draft {
        if draft.action == Action::Allow
            && tx.amount < self.max_amount
            && in_hour_window(tx.hour, self.night_start_hour, self.night_end_hour)
        {
            return draft.change(
                Action::Verify,
                "Micro transaction during night hours",
                Evidence::with_limit(
                    &self.id,
                    "amount",
                    tx.amount.to_string(),
                    self.max_amount.to_string(),
                ),
            );
        }

        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> MicroNightRule {
        MicroNightRule::new("R5_MICRO_NIGHT".to_string(), &RuleParams::default())
    }

    fn test_tx(amount: i64, hour: u8) -> Transaction {
        Transaction::new("S1", "R1", Decimal::new(amount, 0), hour)
    }

    #[test]
    fn test_micro_at_night() {
        for hour in [0, 3, 5, 23] {
            let draft = rule().apply(Draft::new(Action::Allow), &test_tx(20, hour));
            assert_eq!(draft.action, Action::Verify, "hour {hour}");
        }
    }

    #[test]
    fn test_micro_during_day() {
        for hour in [6, 12, 22] {
            let draft = rule().apply(Draft::new(Action::Allow), &test_tx(20, hour));
            assert_eq!(draft.action, Action::Allow, "hour {hour}");
        }
    }

    #[test]
    fn test_amount_boundary() {
        let draft = rule().apply(Draft::new(Action::Allow), &test_tx(50, 2));
        assert_eq!(draft.action, Action::Allow);

        let draft = rule().apply(Draft::new(Action::Allow), &test_tx(49, 2));
        assert_eq!(draft.action, Action::Verify);
    }

    #[test]
    fn test_only_applies_to_allow() {
        let draft = rule().apply(Draft::new(Action::Verify), &test_tx(10, 2));
        assert_eq!(draft.action, Action::Verify);
        assert!(draft.reasoning.is_empty());
    }

    #[test]
    fn test_custom_window_and_amount() {
        let params = RuleParams {
            micro_amount: Decimal::new(100, 0),
            night_start_hour: 1,
            night_end_hour: 4,
            ..Default::default()
        };
        let rule = MicroNightRule::new("R5_MICRO_NIGHT".to_string(), &params);

        let draft = rule.apply(Draft::new(Action::Allow), &test_tx(80, 4));
        assert_eq!(draft.action, Action::Verify);
        assert_eq!(draft.evidence[0].limit, Some("100".to_string()));

        for hour in [0, 5, 23] {
            let draft = rule.apply(Draft::new(Action::Allow), &test_tx(80, hour));
            assert_eq!(draft.action, Action::Allow, "hour {hour}");
        }
    }
}
