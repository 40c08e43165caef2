use chrono::{DateTime, Utc};
use serde::Serialize;
use smallvec::SmallVec;

use crate::domain::{Action, DecisionRecord, TransactionId};
use crate::engine::{ActionResponse, ResponseStatus, ThresholdInfo};

/// Completed prediction for one transaction.
#[derive(Debug, Clone, Serialize)]
pub struct FraudResult {
    pub transaction_id: TransactionId,
    pub fraud_detection: DecisionRecord,
    pub action_response: ActionResponse,
    pub processing_timestamp: DateTime<Utc>,
}

/// Why a prediction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The payload was rejected before scoring
    ValidationError,
    /// Preprocessing, scoring or the decision failed
    Error,
}

/// Response attached to a failed prediction. Always BLOCK.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailSafeResponse {
    pub status: ResponseStatus,
    pub action: Action,
    pub message: String,
    pub user_message: String,
    pub next_steps: SmallVec<[String; 2]>,
}

impl FailSafeResponse {
    pub fn block() -> Self {
        FailSafeResponse {
            status: ResponseStatus::Error,
            action: Action::Block,
            message: "Unable to process transaction due to technical error".to_string(),
            user_message: "Transaction could not be processed. Please try again later.".to_string(),
            next_steps: ["retry_later", "contact_support"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Fail-safe result for a transaction that could not be decided.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResult {
    pub transaction_id: TransactionId,
    pub status: FailureKind,
    pub error: String,
    pub action_response: FailSafeResponse,
    pub processing_timestamp: DateTime<Utc>,
}

impl ErrorResult {
    pub fn new(transaction_id: TransactionId, status: FailureKind, error: impl Into<String>) -> Self {
        ErrorResult {
            transaction_id,
            status,
            error: error.into(),
            action_response: FailSafeResponse::block(),
            processing_timestamp: Utc::now(),
        }
    }
}

/// Outcome of one prediction: a decision, or a fail-safe error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    Completed(FraudResult),
    Failed(ErrorResult),
}

impl Prediction {
    pub fn transaction_id(&self) -> &TransactionId {
        match self {
            Prediction::Completed(result) => &result.transaction_id,
            Prediction::Failed(error) => &error.transaction_id,
        }
    }

    /// Action the caller must apply. Failures always block.
    pub fn action(&self) -> Action {
        match self {
            Prediction::Completed(result) => result.action_response.action,
            Prediction::Failed(error) => error.action_response.action,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Prediction::Completed(_))
    }
}

/// Collaborator and threshold details reported by the service.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub status: String,
    pub scorer: String,
    pub features: usize,
    pub feature_names: Vec<String>,
    pub thresholds: ThresholdInfo,
}
