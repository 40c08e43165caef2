use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{Policy, RiskLevel, ThresholdConfig};
use crate::error::InvalidThresholdError;

/// Errors that can occur during policy loading.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid thresholds: {0}")]
    Thresholds(#[from] InvalidThresholdError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a policy from a YAML file.
pub fn load_policy(path: impl AsRef<Path>) -> Result<Policy, PolicyError> {
    let content = fs::read_to_string(path)?;
    let policy: Policy = serde_yaml::from_str(&content)?;

    validate_policy(&policy)?;

    Ok(policy)
}

/// Validate policy configuration.
pub fn validate_policy(policy: &Policy) -> Result<(), PolicyError> {
    if policy.version.is_empty() {
        return Err(PolicyError::Validation(
            "Policy version cannot be empty".to_string(),
        ));
    }

    ThresholdConfig::new(
        policy.thresholds.allow,
        policy.thresholds.block,
        policy.risk_levels.clone(),
    )?;

    validate_bands(policy)?;

    let params = &policy.rule_params;
    if params.night_start_hour > 23 || params.night_end_hour > 23 {
        return Err(PolicyError::Validation(
            "Night window hours must be between 0 and 23".to_string(),
        ));
    }
    if params.indicators_to_verify == 0 || params.indicators_to_block == 0 {
        return Err(PolicyError::Validation(
            "Indicator counts must be at least 1".to_string(),
        ));
    }
    if params.high_amount_multiplier.is_sign_negative() || params.high_amount_multiplier.is_zero() {
        return Err(PolicyError::Validation(
            "High amount multiplier must be positive".to_string(),
        ));
    }

    Ok(())
}

/// Bands must be LOW, MEDIUM, HIGH in order and tile [0, 1] without gaps.
fn validate_bands(policy: &Policy) -> Result<(), PolicyError> {
    let bands = &policy.risk_levels;

    let levels: Vec<RiskLevel> = bands.iter().map(|band| band.level).collect();
    if levels != [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
        return Err(PolicyError::Validation(format!(
            "Risk levels must be LOW, MEDIUM, HIGH in order, got {:?}",
            levels
        )));
    }

    for band in bands {
        if !band.min.is_finite() || !band.max.is_finite() || band.min >= band.max {
            return Err(PolicyError::Validation(format!(
                "Risk level {} has an empty or invalid range [{}, {})",
                band.level, band.min, band.max
            )));
        }
    }

    if bands[0].min != 0.0 {
        return Err(PolicyError::Validation(format!(
            "Risk levels must start at 0, got {}",
            bands[0].min
        )));
    }

    if bands[bands.len() - 1].max != 1.0 {
        return Err(PolicyError::Validation(format!(
            "Risk levels must end at 1, got {}",
            bands[bands.len() - 1].max
        )));
    }

    for pair in bands.windows(2) {
        if pair[0].max != pair[1].min {
            return Err(PolicyError::Validation(format!(
                "Risk levels {} and {} are not contiguous ({} != {})",
                pair[0].level, pair[1].level, pair[0].max, pair[1].min
            )));
        }
    }

    Ok(())
}

/// Policy loader bound to one file path.
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    policy_path: PathBuf,
}

impl PolicyLoader {
    /// Create a new policy loader.
    pub fn new(policy_path: impl Into<PathBuf>) -> Self {
        PolicyLoader {
            policy_path: policy_path.into(),
        }
    }

    /// Load and validate the policy.
    pub fn load(&self) -> Result<Policy, PolicyError> {
        load_policy(&self.policy_path)
    }

    /// Get the policy file path.
    pub fn policy_path(&self) -> &Path {
        &self.policy_path
    }
}
