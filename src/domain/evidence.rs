use serde::{Deserialize, Serialize};

/// Evidence captured when an overlay rule fires or an indicator is counted.
///
/// Provides audit trail information about why an action was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// The rule that fired
    pub rule_id: String,

    /// Key identifying what was checked (e.g., "amount", "receiver_age_days")
    pub key: String,

    /// The actual value that fired the rule
    pub value: String,

    /// The threshold/limit that was crossed (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl Evidence {
    /// Create evidence for a rule hit.
    pub fn new(rule_id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Evidence {
            rule_id: rule_id.into(),
            key: key.into(),
            value: value.into(),
            limit: None,
        }
    }

    /// Create evidence with a limit/threshold.
    pub fn with_limit(
        rule_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        limit: impl Into<String>,
    ) -> Self {
        Evidence {
            rule_id: rule_id.into(),
            key: key.into(),
            value: value.into(),
            limit: Some(limit.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_creation() {
        let ev = Evidence::new("R4_VIP", "user_type", "vip");
        assert_eq!(ev.rule_id, "R4_VIP");
        assert_eq!(ev.key, "user_type");
        assert_eq!(ev.value, "vip");
        assert!(ev.limit.is_none());
    }

    #[test]
    fn test_evidence_with_limit_serialization() {
        let ev = Evidence::with_limit("R1_HIGH_AMOUNT", "amount", "10000", "5000");
        assert_eq!(ev.limit, Some("5000".to_string()));

        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"limit\":\"5000\""));

        let bare = serde_json::to_string(&Evidence::new("R3", "k", "v")).unwrap();
        assert!(!bare.contains("limit"));
    }
}
