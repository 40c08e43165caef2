use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Action, Evidence, RiskLevel};

/// Unique decision identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(pub String);

impl DecisionId {
    pub fn new() -> Self {
        DecisionId(Uuid::new_v4().to_string())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        DecisionId::new()
    }
}

/// Outcome of one fraud decision. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Unique decision identifier
    #[serde(default)]
    pub decision_id: DecisionId,

    /// Fraud score the decision was made on, rounded to 4 dp
    #[serde(rename = "fraud_score")]
    pub score: f64,

    /// Band the score falls in
    pub risk_level: RiskLevel,

    /// Final action after the rule overlay
    pub action: Action,

    /// Human-readable reasons, in the order they were produced
    pub reasoning: Vec<String>,

    /// Confidence in the action, 0-1, rounded to 3 dp
    pub confidence: f64,

    /// When the decision was made
    pub timestamp: DateTime<Utc>,

    /// Structured evidence from rules that fired
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,

    /// Policy version in force
    #[serde(default)]
    pub policy_version: String,

    /// Threshold revision in force
    #[serde(default)]
    pub threshold_revision: u64,
}

impl DecisionRecord {
    /// Returns true if any rule left evidence.
    pub fn has_evidence(&self) -> bool {
        !self.evidence.is_empty()
    }
}
