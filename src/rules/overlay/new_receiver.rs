use rust_decimal::Decimal;

use crate::domain::{Action, Evidence, Transaction};
use crate::rules::traits::{Draft, OverlayRule};

/// New-receiver rule.
///
/// Large payments to recently created receiver accounts need verification.
#[derive(Debug)]
pub struct NewReceiverRule {
    id: String,
    max_age_days: u32,
    min_amount: Decimal,
}

impl NewReceiverRule {
    pub fn new(id: String, max_age_days: u32, min_amount: Decimal) -> Self {
        NewReceiverRule {
            id,
            max_age_days,
            min_amount,
        }
    }
}

impl OverlayRule for NewReceiverRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, draft: Draft, tx: &Transaction) -> Draft {
        if draft.action != Action::Allow {
            return draft;
        }

        let age = match tx.signals.receiver_age_days {
            Some(age) => age,
            None => return draft,
        };

        if age < self.max_age_days && tx.amount > self.min_amount {
            return draft.change(
                Action::Verify,
                format!(
                    "New receiver (<{} days) with high amount",
                    self.max_age_days
                ),
                Evidence::with_limit(
                    &self.id,
                    "receiver_age_days",
                    age.to_string(),
                    self.max_age_days.to_string(),
                ),
            );
        }

        draft
    }
}
