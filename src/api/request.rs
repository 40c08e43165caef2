use serde_json::Value;

use crate::domain::ThresholdUpdate;

use super::response::ErrorResponse;

/// Batch detection request: a JSON array of transaction payloads.
#[derive(Debug)]
pub struct BatchRequest {
    pub transactions: Vec<Value>,
}

impl BatchRequest {
    /// Check the shape and size of a batch body.
    ///
    /// Items are not validated here; an invalid item fails in its own slot.
    pub fn from_value(body: Value, max_batch_size: usize) -> Result<Self, ErrorResponse> {
        let transactions = match body {
            Value::Array(items) => items,
            _ => {
                return Err(ErrorResponse::error(
                    "Request must be a JSON array of transactions",
                ))
            }
        };

        if transactions.is_empty() {
            return Err(ErrorResponse::error("No transactions provided"));
        }

        if transactions.len() > max_batch_size {
            return Err(ErrorResponse::error(format!(
                "Batch size too large (max {} transactions)",
                max_batch_size
            )));
        }

        Ok(BatchRequest { transactions })
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Parse a threshold update body. Unknown keys are rejected.
pub fn parse_threshold_update(body: Value) -> Result<ThresholdUpdate, ErrorResponse> {
    serde_json::from_value(body)
        .map_err(|e| ErrorResponse::error(format!("Invalid threshold values: {}", e)))
}
