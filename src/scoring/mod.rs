//! Scoring collaborators.
//!
//! The decision core only sees the [`Preprocessor`] and [`Scorer`] traits.
//! The bundled implementations make the service runnable on their own: a
//! fixed feature pipeline and a logistic model loaded from YAML.

pub mod linear;
pub mod preprocessor;

pub use linear::{load_model, LinearScorer, ModelError, ModelFile, Scaling};
pub use preprocessor::{StandardPreprocessor, FEATURE_NAMES};

use std::fmt::Debug;

use crate::domain::Transaction;

/// Numeric features for one transaction, in the preprocessor's fixed order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        FeatureVector(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Turns a validated transaction into a feature vector.
///
/// Must be deterministic, and every call must produce the same length and
/// field order.
pub trait Preprocessor: Send + Sync + Debug {
    /// Feature names in vector order.
    fn feature_names(&self) -> Vec<String>;

    /// Build the feature vector for a transaction.
    fn transform(&self, tx: &Transaction) -> anyhow::Result<FeatureVector>;
}

/// Estimates fraud probability from features.
///
/// The output is not trusted: it may fall outside [0, 1] or be non-finite,
/// and callers are expected to handle both.
pub trait Scorer: Send + Sync + Debug {
    /// Short human-readable description of the model.
    fn describe(&self) -> String;

    /// Raw probability estimate.
    fn score(&self, features: &FeatureVector) -> anyhow::Result<f64>;
}
