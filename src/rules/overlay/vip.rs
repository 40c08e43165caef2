use crate::domain::{Action, Evidence, Transaction, UserTier};
use crate::rules::traits::{Draft, OverlayRule};

/// Protected-tier downgrade.
///
/// The only rule allowed to lower severity: a BLOCK for a protected-tier
/// sender becomes VERIFY.
#[derive(Debug)]
pub struct VipDowngradeRule {
    id: String,
    tier: UserTier,
}

impl VipDowngradeRule {
    pub fn new(id: String, tier: UserTier) -> Self {
        VipDowngradeRule { id, tier }
    }
}

impl OverlayRule for VipDowngradeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, draft: Draft, tx: &Transaction) -> Draft {
        if draft.action == Action::Block && tx.user_tier() == self.tier {
            return draft.change(
                Action::Verify,
                format!(
                    "{} user - downgraded to verification",
                    self.tier.as_str().to_uppercase()
                ),
                Evidence::new(&self.id, "user_type", self.tier.as_str()),
            );
        }

        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskSignals;
    use rust_decimal::Decimal;

    fn test_tx(tier: Option<UserTier>) -> Transaction {
        Transaction::new("S1", "R1", Decimal::new(100, 0), 12).with_signals(RiskSignals {
            user_type: tier,
            ..Default::default()
        })
    }

    fn rule() -> VipDowngradeRule {
        VipDowngradeRule::new("R4_VIP".to_string(), UserTier::Vip)
    }

    #[test]
    fn test_vip_block_downgraded() {
        let draft = rule().apply(Draft::new(Action::Block), &test_tx(Some(UserTier::Vip)));

        assert_eq!(draft.action, Action::Verify);
        assert_eq!(draft.reasoning, vec!["VIP user - downgraded to verification".to_string()]);
        assert_eq!(draft.evidence[0].value, "vip");
    }

    #[test]
    fn test_reason_follows_protected_tier() {
        let rule = VipDowngradeRule::new("R4_VIP".to_string(), UserTier::Regular);

        let draft = rule.apply(Draft::new(Action::Block), &test_tx(Some(UserTier::Regular)));
        assert_eq!(draft.action, Action::Verify);
        assert_eq!(
            draft.reasoning,
            vec!["REGULAR user - downgraded to verification".to_string()]
        );
        assert_eq!(draft.evidence[0].value, "regular");

        let draft = rule.apply(Draft::new(Action::Block), &test_tx(Some(UserTier::Vip)));
        assert_eq!(draft.action, Action::Block);
    }

    #[test]
    fn test_regular_block_kept() {
        let draft = rule().apply(Draft::new(Action::Block), &test_tx(Some(UserTier::Regular)));
        assert_eq!(draft.action, Action::Block);

        let draft = rule().apply(Draft::new(Action::Block), &test_tx(None));
        assert_eq!(draft.action, Action::Block);
    }

    #[test]
    fn test_vip_non_block_untouched() {
        for action in [Action::Allow, Action::Verify] {
            let draft = rule().apply(Draft::new(action), &test_tx(Some(UserTier::Vip)));
            assert_eq!(draft.action, action);
            assert!(draft.reasoning.is_empty());
        }
    }
}
