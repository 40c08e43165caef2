//! Collaborator doubles for tests and benchmarks.

use anyhow::{anyhow, bail};
use rust_decimal::prelude::ToPrimitive;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::Transaction;
use crate::scoring::{FeatureVector, Preprocessor, Scorer};

/// Emits `[amount, hour]` with no engineering.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughPreprocessor;

impl Preprocessor for PassthroughPreprocessor {
    fn feature_names(&self) -> Vec<String> {
        vec!["amount".to_string(), "transaction_time".to_string()]
    }

    fn transform(&self, tx: &Transaction) -> anyhow::Result<FeatureVector> {
        let amount = tx
            .amount
            .to_f64()
            .ok_or_else(|| anyhow!("amount out of range"))?;
        Ok(FeatureVector::new(vec![amount, f64::from(tx.hour)]))
    }
}

/// Preprocessor that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPreprocessor;

impl Preprocessor for FailingPreprocessor {
    fn feature_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn transform(&self, _tx: &Transaction) -> anyhow::Result<FeatureVector> {
        bail!("feature store unavailable")
    }
}

/// Returns the same raw score for every input, which may be out of range or
/// non-finite.
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub f64);

impl Scorer for FixedScorer {
    fn describe(&self) -> String {
        format!("fixed score {}", self.0)
    }

    fn score(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        Ok(self.0)
    }
}

/// Scorer that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingScorer;

impl Scorer for FailingScorer {
    fn describe(&self) -> String {
        "failing scorer".to_string()
    }

    fn score(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        bail!("model backend unavailable")
    }
}

/// Scorer that panics, standing in for a crashed model runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingScorer;

impl Scorer for PanickingScorer {
    fn describe(&self) -> String {
        "panicking scorer".to_string()
    }

    fn score(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        panic!("model runtime crashed")
    }
}

/// Fails on the n-th call (0-based) and returns `score` otherwise.
#[derive(Debug, Default)]
pub struct FlakyScorer {
    score: f64,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FlakyScorer {
    pub fn new(score: f64, fail_on: usize) -> Self {
        FlakyScorer {
            score,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Scorer for FlakyScorer {
    fn describe(&self) -> String {
        format!("flaky scorer failing on call {}", self.fail_on)
    }

    fn score(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on {
            bail!("transient scoring failure on call {call}");
        }
        Ok(self.score)
    }
}
