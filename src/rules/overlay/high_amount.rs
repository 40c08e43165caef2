use rust_decimal::Decimal;

use crate::domain::{Action, Evidence, Transaction};
use crate::rules::traits::{Draft, OverlayRule};

/// High-amount rule.
///
/// Sends an otherwise allowed transaction to verification when the amount
/// exceeds a multiple of the sender's weekly average. A sender with no
/// recorded average is compared against zero.
#[derive(Debug)]
pub struct HighAmountRule {
    id: String,
    multiplier: Decimal,
}

impl HighAmountRule {
    pub fn new(id: String, multiplier: Decimal) -> Self {
        HighAmountRule { id, multiplier }
    }
}

impl OverlayRule for HighAmountRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, draft: Draft, tx: &Transaction) -> Draft {
        if draft.action != Action::Allow {
            return draft;
        }

        let average = tx.signals.avg_amount_last_week.unwrap_or(Decimal::ZERO);

        // A limit past Decimal::MAX cannot be exceeded
        let limit = match average.checked_mul(self.multiplier) {
            Some(limit) => limit,
            None => return draft,
        };

        if tx.amount > limit {
            return draft.change(
                Action::Verify,
                format!("High amount transaction (>{}x average)", self.multiplier.normalize()),
                Evidence::with_limit(&self.id, "amount", tx.amount.to_string(), limit.to_string()),
            );
        }

        draft
    }
}
