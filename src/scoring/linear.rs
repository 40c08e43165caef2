use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::preprocessor::{StandardPreprocessor, FEATURE_NAMES};
use super::{FeatureVector, Scorer};

/// Errors that can occur while loading a model file.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Per-feature standardisation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// Logistic model as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    /// Model version identifier
    pub model_version: String,

    /// Feature names the weights were trained against, in order
    #[serde(default)]
    pub features: Vec<String>,

    pub weights: Vec<f64>,

    pub bias: f64,

    /// Standardisation applied before the weights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Scaling>,
}

impl ModelFile {
    /// Hand-tuned weights over unscaled features, used when no model file is
    /// configured. Flags carry most of the weight; the score stays low for
    /// ordinary transactions.
    pub fn builtin() -> Self {
        ModelFile {
            model_version: "builtin-heuristic".to_string(),
            features: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            weights: vec![
                0.0, // amount
                0.0, // transaction_time
                0.05, // transaction_frequency_last_24h
                0.0, // avg_amount_last_week
                0.002, // geo_distance_from_last_txn
                -0.001, // receiver_age_days
                0.3, // receiver_fraud_reports
                0.6, // is_unusual_hour
                0.05, // amount_log
                0.1, // amount_zscore
                1.0, // high_amount_flag
                0.3, // micro_amount_flag
                0.8, // new_receiver_flag
                1.2, // high_risk_receiver
                0.7, // location_risk
                0.6, // high_frequency_flag
                0.5, // night_transaction
            ],
            bias: -3.5,
            scaling: None,
        }
    }

    /// Check the model against the bundled feature pipeline.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.model_version.is_empty() {
            return Err(ModelError::Validation(
                "Model version cannot be empty".to_string(),
            ));
        }

        let expected = FEATURE_NAMES.len();
        if self.weights.len() != expected {
            return Err(ModelError::Validation(format!(
                "Expected {} weights, got {}",
                expected,
                self.weights.len()
            )));
        }

        if !self.features.is_empty() && self.features.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelError::Validation(
                "Feature names do not match the feature pipeline".to_string(),
            ));
        }

        if self.weights.iter().any(|w| !w.is_finite()) || !self.bias.is_finite() {
            return Err(ModelError::Validation(
                "Weights and bias must be finite".to_string(),
            ));
        }

        if let Some(scaling) = &self.scaling {
            if scaling.mean.len() != expected || scaling.std.len() != expected {
                return Err(ModelError::Validation(format!(
                    "Scaling must have {} means and deviations",
                    expected
                )));
            }
        }

        Ok(())
    }

    /// Split into the matching preprocessor and scorer.
    pub fn into_parts(self) -> (StandardPreprocessor, LinearScorer) {
        let preprocessor = match self.scaling {
            Some(scaling) => StandardPreprocessor::with_scaling(scaling),
            None => StandardPreprocessor::new(),
        };
        let scorer = LinearScorer::new(self.model_version, self.weights, self.bias);

        (preprocessor, scorer)
    }
}

/// Load and validate a model from a YAML file.
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelFile, ModelError> {
    let content = fs::read_to_string(path)?;
    let model: ModelFile = serde_yaml::from_str(&content)?;

    model.validate()?;

    Ok(model)
}

/// Logistic regression scorer: `sigmoid(bias + weights . features)`.
#[derive(Debug, Clone)]
pub struct LinearScorer {
    version: String,
    weights: Vec<f64>,
    bias: f64,
}

impl LinearScorer {
    pub fn new(version: impl Into<String>, weights: Vec<f64>, bias: f64) -> Self {
        LinearScorer {
            version: version.into(),
            weights,
            bias,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Scorer for LinearScorer {
    fn describe(&self) -> String {
        format!(
            "logistic regression {} ({} weights)",
            self.version,
            self.weights.len()
        )
    }

    fn score(&self, features: &FeatureVector) -> anyhow::Result<f64> {
        ensure!(
            features.len() == self.weights.len(),
            "expected {} features, got {}",
            self.weights.len(),
            features.len()
        );

        let z = self.bias
            + self
                .weights
                .iter()
                .zip(features.as_slice())
                .map(|(w, x)| w * x)
                .sum::<f64>();

        Ok(sigmoid(z))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
