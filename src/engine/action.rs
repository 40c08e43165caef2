use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::domain::{Action, DecisionRecord, RiskLevel};

/// Outcome status reported alongside an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Pending,
    Blocked,
    Error,
}

/// Downstream handling instructions for a decided action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: ResponseStatus,

    pub action: Action,

    /// Message for operators and calling systems
    pub message: String,

    /// Message safe to show the end user
    pub user_message: String,

    /// Steps the caller should take next, in order
    pub next_steps: SmallVec<[String; 2]>,

    /// Verification channels offered for VERIFY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_methods: Option<Vec<String>>,

    /// Reference quoted to support for BLOCK
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_reference: Option<String>,

    pub fraud_score: f64,

    pub risk_level: RiskLevel,
}

/// Maps decisions to fixed response templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionProcessor;

impl ActionProcessor {
    pub fn new() -> Self {
        ActionProcessor
    }

    /// Build the response for a decision.
    pub fn process_action(&self, decision: &DecisionRecord) -> ActionResponse {
        self.process_action_at(decision, Utc::now())
    }

    /// Build the response as of `now`, which seeds the BLOCK support reference.
    pub fn process_action_at(&self, decision: &DecisionRecord, now: DateTime<Utc>) -> ActionResponse {
        let response = match decision.action {
            Action::Allow => ActionResponse {
                status: ResponseStatus::Success,
                action: Action::Allow,
                message: "Transaction approved successfully".to_string(),
                user_message: "Your transaction has been processed".to_string(),
                next_steps: steps(&["complete_transaction"]),
                verification_methods: None,
                support_reference: None,
                fraud_score: decision.score,
                risk_level: decision.risk_level,
            },
            Action::Verify => ActionResponse {
                status: ResponseStatus::Pending,
                action: Action::Verify,
                message: "Additional verification required".to_string(),
                user_message: "Please complete additional verification for security".to_string(),
                next_steps: steps(&["send_otp", "request_verification"]),
                verification_methods: Some(
                    ["SMS_OTP", "EMAIL_OTP", "BIOMETRIC"]
                        .iter()
                        .map(|m| m.to_string())
                        .collect(),
                ),
                support_reference: None,
                fraud_score: decision.score,
                risk_level: decision.risk_level,
            },
            Action::Block => {
                let reference = support_reference(now);
                warn!(
                    decision_id = %decision.decision_id.0,
                    support_reference = %reference,
                    score = decision.score,
                    "Transaction blocked"
                );

                ActionResponse {
                    status: ResponseStatus::Blocked,
                    action: Action::Block,
                    message: "Transaction blocked due to security concerns".to_string(),
                    user_message: "Transaction could not be processed. Please contact customer \
                                   support if you believe this is an error."
                        .to_string(),
                    next_steps: steps(&["contact_support", "manual_review"]),
                    verification_methods: None,
                    support_reference: Some(reference),
                    fraud_score: decision.score,
                    risk_level: decision.risk_level,
                }
            }
            Action::Unknown => ActionResponse {
                status: ResponseStatus::Error,
                action: Action::Unknown,
                message: "Unable to process transaction".to_string(),
                user_message: "Technical error occurred. Please try again later.".to_string(),
                next_steps: steps(&["retry_later", "contact_support"]),
                verification_methods: None,
                support_reference: None,
                fraud_score: decision.score,
                risk_level: decision.risk_level,
            },
        };

        debug!(
            decision_id = %decision.decision_id.0,
            action = %response.action,
            "Action processed"
        );

        response
    }
}

/// Support reference derived from a timestamp, `REF-YYYYMMDDHHMMSS`.
pub fn support_reference(at: DateTime<Utc>) -> String {
    at.format("REF-%Y%m%d%H%M%S").to_string()
}

fn steps(names: &[&str]) -> SmallVec<[String; 2]> {
    names.iter().map(|name| name.to_string()).collect()
}
