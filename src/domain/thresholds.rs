use serde::{Deserialize, Serialize};

use super::{Action, RiskLevel};
use crate::error::InvalidThresholdError;

/// Default upper bound (exclusive) of the ALLOW region.
pub const DEFAULT_ALLOW_MAX: f64 = 0.4;

/// Default lower bound (inclusive) of the BLOCK region.
pub const DEFAULT_BLOCK_MIN: f64 = 0.7;

/// Distance from the nearer threshold at which confidence saturates.
pub const CONFIDENCE_SATURATION: f64 = 0.2;

/// A risk band covering `[min, max)` of the score range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub level: RiskLevel,
    pub min: f64,
    pub max: f64,
}

impl RiskBand {
    pub fn new(level: RiskLevel, min: f64, max: f64) -> Self {
        RiskBand { level, min, max }
    }

    #[inline]
    pub fn contains(&self, score: f64) -> bool {
        self.min <= score && score < self.max
    }
}

/// Two-threshold classifier plus risk bands.
///
/// Invariants: `allow_max < block_min`, both in [0, 1]; bands are sorted,
/// contiguous, and cover [0, 1]. Instances are immutable once shared;
/// updates produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Scores below this are allowed
    #[serde(rename = "allow")]
    pub allow_max: f64,

    /// Scores at or above this are blocked
    #[serde(rename = "block")]
    pub block_min: f64,

    /// Risk bands in ascending score order
    #[serde(rename = "risk_levels")]
    pub bands: Vec<RiskBand>,
}

impl ThresholdConfig {
    /// Build a config, checking threshold invariants.
    ///
    /// Band layout is checked separately by the policy loader.
    pub fn new(
        allow_max: f64,
        block_min: f64,
        bands: Vec<RiskBand>,
    ) -> Result<Self, InvalidThresholdError> {
        check_threshold("allow", allow_max)?;
        check_threshold("block", block_min)?;
        if allow_max >= block_min {
            return Err(InvalidThresholdError::Ordering {
                allow: allow_max,
                block: block_min,
            });
        }

        Ok(ThresholdConfig {
            allow_max,
            block_min,
            bands,
        })
    }

    /// Base action from the two-threshold comparison.
    pub fn base_action(&self, score: f64) -> Action {
        if score < self.allow_max {
            Action::Allow
        } else if score < self.block_min {
            Action::Verify
        } else {
            Action::Block
        }
    }

    /// Risk level of the first band containing the score.
    ///
    /// A score of exactly 1.0 sits outside every half-open band and falls
    /// back to HIGH.
    pub fn risk_level(&self, score: f64) -> RiskLevel {
        self.bands
            .iter()
            .find(|band| band.contains(score))
            .map(|band| band.level)
            .unwrap_or(RiskLevel::High)
    }

    /// Confidence from the distance to the nearer threshold, rounded to 3 dp.
    pub fn confidence(&self, score: f64) -> f64 {
        let distance = (score - self.allow_max)
            .abs()
            .min((score - self.block_min).abs());
        let confidence = (distance / CONFIDENCE_SATURATION).clamp(0.0, 1.0);
        round_to(confidence, 3)
    }

    /// Apply a partial update, returning the new config.
    ///
    /// Every supplied key is checked and the merged pair must keep
    /// `allow < block`. On any violation nothing is applied.
    pub fn apply(&self, update: &ThresholdUpdate) -> Result<Self, InvalidThresholdError> {
        if let Some(allow) = update.allow {
            check_threshold("allow", allow)?;
        }
        if let Some(block) = update.block {
            check_threshold("block", block)?;
        }

        let allow = update.allow.unwrap_or(self.allow_max);
        let block = update.block.unwrap_or(self.block_min);

        ThresholdConfig::new(allow, block, self.bands.clone())
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            allow_max: DEFAULT_ALLOW_MAX,
            block_min: DEFAULT_BLOCK_MIN,
            bands: default_bands(),
        }
    }
}

/// LOW [0, 0.4), MEDIUM [0.4, 0.7), HIGH [0.7, 1.0).
pub fn default_bands() -> Vec<RiskBand> {
    vec![
        RiskBand::new(RiskLevel::Low, 0.0, DEFAULT_ALLOW_MAX),
        RiskBand::new(RiskLevel::Medium, DEFAULT_ALLOW_MAX, DEFAULT_BLOCK_MIN),
        RiskBand::new(RiskLevel::High, DEFAULT_BLOCK_MIN, 1.0),
    ]
}

/// Partial threshold update. Absent keys keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<f64>,
}

impl ThresholdUpdate {
    pub fn new(allow: Option<f64>, block: Option<f64>) -> Self {
        ThresholdUpdate { allow, block }
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_none() && self.block.is_none()
    }
}

fn check_threshold(key: &'static str, value: f64) -> Result<(), InvalidThresholdError> {
    if !value.is_finite() {
        return Err(InvalidThresholdError::NotFinite { key });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(InvalidThresholdError::OutOfRange { key, value });
    }
    Ok(())
}

/// Round half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_action_regions() {
        let config = ThresholdConfig::default();

        for score in [0.0, 0.1, 0.2, 0.39, 0.3999] {
            assert_eq!(config.base_action(score), Action::Allow, "score {score}");
            assert_eq!(config.risk_level(score), RiskLevel::Low, "score {score}");
        }
        for score in [0.4, 0.5, 0.65, 0.6999] {
            assert_eq!(config.base_action(score), Action::Verify, "score {score}");
            assert_eq!(config.risk_level(score), RiskLevel::Medium, "score {score}");
        }
        for score in [0.7, 0.75, 0.9, 1.0] {
            assert_eq!(config.base_action(score), Action::Block, "score {score}");
            assert_eq!(config.risk_level(score), RiskLevel::High, "score {score}");
        }
    }

    #[test]
    fn test_confidence_near_thresholds() {
        let config = ThresholdConfig::default();

        assert_eq!(config.confidence(0.4), 0.0);
        assert_eq!(config.confidence(0.7), 0.0);
        assert_eq!(config.confidence(0.39), 0.05);
        assert!(config.confidence(0.39) < 0.5);
    }

    #[test]
    fn test_confidence_saturates() {
        let config = ThresholdConfig::default();

        assert_eq!(config.confidence(0.1), 1.0);
        assert_eq!(config.confidence(0.2), 1.0);
        assert_eq!(config.confidence(0.9), 1.0);
        assert_eq!(config.confidence(1.0), 1.0);
        // Midpoint between thresholds is 0.15 from both
        assert_eq!(config.confidence(0.55), 0.75);
    }

    #[test]
    fn test_confidence_monotonic_in_distance() {
        let config = ThresholdConfig::default();

        let mut previous = -1.0;
        for step in 0..=40 {
            let score = 0.4 - step as f64 * 0.01;
            if score < 0.0 {
                break;
            }
            let confidence = config.confidence(score);
            assert!(confidence >= previous, "score {score}");
            previous = confidence;
        }
    }

    #[test]
    fn test_apply_partial_update() {
        let config = ThresholdConfig::default();

        let updated = config.apply(&ThresholdUpdate::new(Some(0.3), None)).unwrap();
        assert_eq!(updated.allow_max, 0.3);
        assert_eq!(updated.block_min, 0.7);
        assert_eq!(updated.bands, config.bands);
    }

    #[test]
    fn test_apply_rejects_inverted_thresholds() {
        let config = ThresholdConfig::default();

        let result = config.apply(&ThresholdUpdate::new(Some(0.8), Some(0.3)));
        assert_eq!(
            result,
            Err(InvalidThresholdError::Ordering {
                allow: 0.8,
                block: 0.3
            })
        );
    }

    #[test]
    fn test_apply_rejects_partial_that_breaks_ordering() {
        let config = ThresholdConfig::default();

        // allow alone above the current block
        let result = config.apply(&ThresholdUpdate::new(Some(0.75), None));
        assert!(matches!(result, Err(InvalidThresholdError::Ordering { .. })));

        // equal thresholds are not allowed either
        let result = config.apply(&ThresholdUpdate::new(None, Some(0.4)));
        assert!(matches!(result, Err(InvalidThresholdError::Ordering { .. })));
    }

    #[test]
    fn test_apply_rejects_out_of_range_and_nan() {
        let config = ThresholdConfig::default();

        let result = config.apply(&ThresholdUpdate::new(None, Some(1.2)));
        assert!(matches!(
            result,
            Err(InvalidThresholdError::OutOfRange { key: "block", .. })
        ));

        let result = config.apply(&ThresholdUpdate::new(Some(f64::NAN), None));
        assert_eq!(result, Err(InvalidThresholdError::NotFinite { key: "allow" }));
    }

    #[test]
    fn test_update_rejects_unknown_keys() {
        let parsed: Result<ThresholdUpdate, _> = serde_json::from_str(r#"{"allow": 0.3, "alow": 0.2}"#);
        assert!(parsed.is_err());

        let parsed: ThresholdUpdate = serde_json::from_str(r#"{"block": 0.8}"#).unwrap();
        assert_eq!(parsed, ThresholdUpdate::new(None, Some(0.8)));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(0.0499999, 3), 0.05);
    }
}
