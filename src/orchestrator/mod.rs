//! Prediction pipeline: validate, preprocess, score, decide, respond.

pub mod result;

pub use result::{ErrorResult, FailSafeResponse, FailureKind, FraudResult, ModelInfo, Prediction};

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{ThresholdUpdate, Transaction, TransactionId};
use crate::engine::{ActionProcessor, DecisionEngine, PolicySnapshot, ThresholdStore};
use crate::error::{InternalError, InvalidThresholdError, ValidationError};
use crate::observability::{MetricsRegistry, TimingGuard};
use crate::scoring::{ModelFile, Preprocessor, Scorer};

/// Drives the collaborators and the decision core for each transaction.
///
/// Internal failures never escape: they become a fail-safe BLOCK result.
/// Only payload validation errors are returned to the caller.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    preprocessor: Arc<dyn Preprocessor>,
    scorer: Arc<dyn Scorer>,
    engine: DecisionEngine,
    processor: ActionProcessor,
    metrics: Arc<MetricsRegistry>,
}

impl Orchestrator {
    pub fn new(
        preprocessor: Arc<dyn Preprocessor>,
        scorer: Arc<dyn Scorer>,
        engine: DecisionEngine,
    ) -> Self {
        Orchestrator {
            preprocessor,
            scorer,
            engine,
            processor: ActionProcessor::new(),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Orchestrator using the bundled preprocessor and linear scorer.
    pub fn from_model(model: ModelFile, store: Arc<ThresholdStore>) -> Self {
        let (preprocessor, scorer) = model.into_parts();
        Orchestrator::new(
            Arc::new(preprocessor),
            Arc::new(scorer),
            DecisionEngine::new(store),
        )
    }

    /// Record into a shared registry instead of a private one.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Predict on an untyped payload.
    ///
    /// Fails only when the payload is invalid. Every later failure is
    /// reported as a [`Prediction::Failed`] that blocks the transaction.
    pub fn predict_fraud(&self, payload: &Value) -> Result<Prediction, ValidationError> {
        let tx = match Transaction::from_json(payload) {
            Ok(tx) => tx,
            Err(e) => {
                self.metrics.record_validation_error();
                warn!(
                    transaction_id = %payload_id(payload),
                    error = %e,
                    "Transaction rejected"
                );
                return Err(e);
            }
        };

        Ok(self.predict(&tx))
    }

    /// Predict on a validated transaction.
    pub fn predict(&self, tx: &Transaction) -> Prediction {
        let _timer = TimingGuard::new(&self.metrics);

        match self.run(tx) {
            Ok(result) => {
                self.metrics
                    .record_decision(result.fraud_detection.action);
                self.metrics
                    .record_rule_triggers(&result.fraud_detection.evidence);
                info!(
                    transaction_id = %tx.transaction_id,
                    action = %result.action_response.action,
                    "Fraud detection completed"
                );
                Prediction::Completed(result)
            }
            Err(e) => {
                self.metrics.record_internal_error();
                error!(
                    transaction_id = %tx.transaction_id,
                    error = %e,
                    "Fraud detection failed, blocking"
                );
                Prediction::Failed(ErrorResult::new(
                    tx.transaction_id.clone(),
                    FailureKind::Error,
                    e.to_string(),
                ))
            }
        }
    }

    fn run(&self, tx: &Transaction) -> Result<FraudResult, InternalError> {
        let features = self
            .preprocessor
            .transform(tx)
            .map_err(InternalError::Preprocess)?;

        let raw = self
            .scorer
            .score(&features)
            .map_err(InternalError::Scoring)?;
        if !raw.is_finite() {
            return Err(InternalError::NonFiniteScore(raw));
        }

        let score = raw.clamp(0.0, 1.0);
        if score != raw {
            debug!(transaction_id = %tx.transaction_id, raw, score, "Score clamped");
        }

        let decision = self.engine.make_decision(score, Some(tx))?;
        let action_response = self.processor.process_action(&decision);

        Ok(FraudResult {
            transaction_id: tx.transaction_id.clone(),
            fraud_detection: decision,
            action_response,
            processing_timestamp: Utc::now(),
        })
    }

    /// Predict on each payload independently, preserving order.
    ///
    /// Items without a `transaction_id` get `BATCH_0001`, `BATCH_0002`, ...
    /// by position. An invalid item yields a failed prediction in its slot.
    pub fn batch_predict(&self, items: Vec<Value>) -> Vec<Prediction> {
        self.metrics.record_batch(items.len());

        items
            .into_iter()
            .enumerate()
            .map(|(index, mut item)| {
                let fallback_id = batch_id(index);
                if let Some(map) = item.as_object_mut() {
                    let has_id = map.get("transaction_id").is_some_and(|v| !v.is_null());
                    if !has_id {
                        map.insert("transaction_id".to_string(), Value::String(fallback_id.clone()));
                    }
                }

                match self.predict_fraud(&item) {
                    Ok(prediction) => prediction,
                    Err(e) => {
                        let id = item
                            .get("transaction_id")
                            .and_then(Value::as_str)
                            .map(TransactionId::new)
                            .unwrap_or_else(|| TransactionId::new(fallback_id));
                        Prediction::Failed(ErrorResult::new(id, FailureKind::ValidationError, e.to_string()))
                    }
                }
            })
            .collect()
    }

    /// Apply a partial threshold update, all or nothing.
    pub fn update_thresholds(
        &self,
        update: &ThresholdUpdate,
    ) -> Result<Arc<PolicySnapshot>, InvalidThresholdError> {
        let result = self.engine.update_thresholds(update);
        self.metrics.record_threshold_update(result.is_ok());
        result
    }

    /// Describe the collaborators and the current thresholds.
    pub fn model_info(&self) -> ModelInfo {
        let feature_names = self.preprocessor.feature_names();

        ModelInfo {
            status: "loaded".to_string(),
            scorer: self.scorer.describe(),
            features: feature_names.len(),
            feature_names,
            thresholds: self.engine.get_threshold_info(),
        }
    }

    /// A well-formed demo transaction.
    pub fn sample_transaction(&self) -> Transaction {
        Transaction::sample()
    }
}

fn batch_id(index: usize) -> String {
    format!("BATCH_{:04}", index + 1)
}

fn payload_id(payload: &Value) -> &str {
    payload
        .get("transaction_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}
