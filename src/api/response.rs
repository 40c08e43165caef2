use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Transaction;
use crate::engine::ThresholdInfo;
use crate::orchestrator::Prediction;

/// Batch detection response.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub status: String,
    pub total_transactions: usize,
    pub results: Vec<Prediction>,
    pub processing_time: DateTime<Utc>,
}

impl BatchResponse {
    pub fn new(results: Vec<Prediction>) -> Self {
        BatchResponse {
            status: "success".to_string(),
            total_transactions: results.len(),
            results,
            processing_time: Utc::now(),
        }
    }
}

/// Response to an accepted threshold update.
#[derive(Debug, Serialize)]
pub struct ThresholdUpdateResponse {
    pub status: String,
    pub message: String,
    pub new_thresholds: ThresholdInfo,
}

impl ThresholdUpdateResponse {
    pub fn new(new_thresholds: ThresholdInfo) -> Self {
        ThresholdUpdateResponse {
            status: "success".to_string(),
            message: "Thresholds updated successfully".to_string(),
            new_thresholds,
        }
    }
}

/// Demo transaction response.
#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub status: String,
    pub sample_transaction: Transaction,
    pub description: String,
}

impl SampleResponse {
    pub fn new(sample_transaction: Transaction) -> Self {
        SampleResponse {
            status: "success".to_string(),
            sample_transaction,
            description: "Sample transaction data for testing the fraud detection API".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub policy_version: String,
    pub threshold_revision: u64,
    pub uptime_secs: u64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            status: status.into(),
        }
    }

    /// Payload failed transaction validation.
    pub fn validation(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "validation_error")
    }

    pub fn error(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionId;
    use crate::engine::ThresholdStore;
    use crate::orchestrator::{ErrorResult, FailureKind};

    #[test]
    fn test_batch_response_serialization() {
        let resp = BatchResponse::new(vec![Prediction::Failed(ErrorResult::new(
            TransactionId::new("BATCH_0001"),
            FailureKind::ValidationError,
            "invalid transaction: amount is required",
        ))]);

        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["total_transactions"], 1);
        assert_eq!(json["results"][0]["transaction_id"], "BATCH_0001");
        assert_eq!(json["results"][0]["action_response"]["action"], "BLOCK");
    }

    #[test]
    fn test_threshold_update_response() {
        let store = ThresholdStore::default();
        let resp = ThresholdUpdateResponse::new(ThresholdInfo::from(store.snapshot().as_ref()));

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["new_thresholds"]["thresholds"]["allow"], 0.4);
        assert_eq!(json["new_thresholds"]["revision"], 1);
    }

    #[test]
    fn test_error_response() {
        let resp = ErrorResponse::validation("invalid transaction: sender_id is required");

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("validation_error"));
        assert!(json.contains("sender_id"));
    }
}
