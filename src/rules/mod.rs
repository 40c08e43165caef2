pub mod overlay;
pub mod traits;

pub use overlay::{
    HighAmountRule, MicroNightRule, NewReceiverRule, RiskIndicatorRule, VipDowngradeRule,
};
pub use traits::{Draft, OverlayRule};

use crate::domain::{Action, RuleParams, Transaction};
use std::sync::Arc;

pub const HIGH_AMOUNT_ID: &str = "R1_HIGH_AMOUNT";
pub const NEW_RECEIVER_ID: &str = "R2_NEW_RECEIVER";
pub const RISK_INDICATORS_ID: &str = "R3_RISK_INDICATORS";
pub const VIP_DOWNGRADE_ID: &str = "R4_VIP_DOWNGRADE";
pub const MICRO_NIGHT_ID: &str = "R5_MICRO_NIGHT";

/// The business-rule overlay, in evaluation order.
///
/// Order is part of the behavior: high amount, new receiver, indicator
/// tally, VIP downgrade, micro-night. Later rules see (and may override)
/// the action left by earlier ones.
#[derive(Debug, Clone)]
pub struct RuleChain {
    rules: Vec<Arc<dyn OverlayRule>>,
}

impl RuleChain {
    /// Build the standard chain from policy parameters.
    pub fn from_params(params: &RuleParams) -> Self {
        let rules: Vec<Arc<dyn OverlayRule>> = vec![
            Arc::new(HighAmountRule::new(
                HIGH_AMOUNT_ID.to_string(),
                params.high_amount_multiplier,
            )),
            Arc::new(NewReceiverRule::new(
                NEW_RECEIVER_ID.to_string(),
                params.new_receiver_max_age_days,
                params.new_receiver_min_amount,
            )),
            Arc::new(RiskIndicatorRule::new(
                RISK_INDICATORS_ID.to_string(),
                params,
            )),
            Arc::new(VipDowngradeRule::new(
                VIP_DOWNGRADE_ID.to_string(),
                params.protected_tier,
            )),
            Arc::new(MicroNightRule::new(MICRO_NIGHT_ID.to_string(), params)),
        ];

        RuleChain { rules }
    }

    /// Chain with custom rules, mainly for tests.
    pub fn with_rules(rules: Vec<Arc<dyn OverlayRule>>) -> Self {
        RuleChain { rules }
    }

    /// Fold every rule over the base action.
    pub fn apply(&self, base: Action, tx: &Transaction) -> Draft {
        self.rules
            .iter()
            .fold(Draft::new(base), |draft, rule| rule.apply(draft, tx))
    }

    /// Rule ids in evaluation order.
    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleChain {
    fn default() -> Self {
        RuleChain::from_params(&RuleParams::default())
    }
}
