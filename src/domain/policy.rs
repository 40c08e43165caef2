use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::thresholds::{default_bands, RiskBand, DEFAULT_ALLOW_MAX, DEFAULT_BLOCK_MIN};
use super::transaction::UserTier;

/// Decision policy: thresholds, risk bands and business-rule parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Policy version identifier
    #[serde(rename = "policy_version")]
    pub version: String,

    /// Classification thresholds
    #[serde(default)]
    pub thresholds: ThresholdValues,

    /// Risk bands in ascending order
    #[serde(default = "default_bands")]
    pub risk_levels: Vec<RiskBand>,

    /// Parameters used by the business-rule overlay
    #[serde(default)]
    pub rule_params: RuleParams,
}

impl Policy {
    /// Built-in policy used when no policy file is configured.
    pub fn builtin() -> Self {
        Policy {
            version: "builtin".to_string(),
            thresholds: ThresholdValues::default(),
            risk_levels: default_bands(),
            rule_params: RuleParams::default(),
        }
    }
}

/// Threshold pair as written in a policy file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdValues {
    pub allow: f64,
    pub block: f64,
}

impl Default for ThresholdValues {
    fn default() -> Self {
        ThresholdValues {
            allow: DEFAULT_ALLOW_MAX,
            block: DEFAULT_BLOCK_MIN,
        }
    }
}

/// Parameters used by the business-rule overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleParams {
    /// Amount above this multiple of the weekly average is "high"
    pub high_amount_multiplier: Decimal,

    /// Receivers younger than this many days are "new"
    pub new_receiver_max_age_days: u32,

    /// Amount above which a new receiver needs verification
    pub new_receiver_min_amount: Decimal,

    /// Distance from the previous transaction counted as distant
    pub distant_location_km: f64,

    /// 24h transaction count above which frequency is high
    pub high_frequency_24h: u32,

    /// Fraud reports above which a receiver is high-risk
    pub high_risk_receiver_reports: u32,

    /// Indicator count escalating ALLOW to VERIFY
    pub indicators_to_verify: usize,

    /// Indicator count escalating VERIFY to BLOCK
    pub indicators_to_block: usize,

    /// Tier whose would-be blocks are downgraded to verification
    pub protected_tier: UserTier,

    /// Amount below which a transaction is a micro transaction
    pub micro_amount: Decimal,

    /// Night window start hour (inclusive)
    pub night_start_hour: u8,

    /// Night window end hour (inclusive), wrapping past midnight
    pub night_end_hour: u8,
}

impl RuleParams {
    /// Returns true if the hour lies in the night window.
    pub fn is_night_hour(&self, hour: u8) -> bool {
        in_hour_window(hour, self.night_start_hour, self.night_end_hour)
    }
}

/// Inclusive hour window; wraps past midnight when `start > end`.
pub fn in_hour_window(hour: u8, start: u8, end: u8) -> bool {
    if start <= end {
        (start..=end).contains(&hour)
    } else {
        hour >= start || hour <= end
    }
}

impl Default for RuleParams {
    fn default() -> Self {
        RuleParams {
            high_amount_multiplier: Decimal::new(5, 0),
            new_receiver_max_age_days: 7,
            new_receiver_min_amount: Decimal::new(10000, 0),
            distant_location_km: 100.0,
            high_frequency_24h: 10,
            high_risk_receiver_reports: 3,
            indicators_to_verify: 3,
            indicators_to_block: 4,
            protected_tier: UserTier::Vip,
            micro_amount: Decimal::new(50, 0),
            night_start_hour: 23,
            night_end_hour: 5,
        }
    }
}
