use serde::{Deserialize, Serialize};
use std::fmt;

/// Action taken on a transaction.
///
/// Ordered by severity from least to most severe. Every business rule
/// except the VIP downgrade may only move an action up this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Transaction approved
    Allow,
    /// Additional verification (OTP, biometric) required
    Verify,
    /// Transaction stopped
    Block,
    /// Action string not recognized when reading an external record
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Returns the severity rank (0-2), with unknown actions treated as blocks.
    #[inline]
    pub fn severity(&self) -> u8 {
        match self {
            Action::Allow => 0,
            Action::Verify => 1,
            Action::Block | Action::Unknown => 2,
        }
    }

    /// Returns true if this action lets the transaction through.
    #[inline]
    pub fn is_allowed(&self) -> bool {
        *self == Action::Allow
    }

    /// Returns true if this action stops the transaction.
    #[inline]
    pub fn is_blocked(&self) -> bool {
        *self == Action::Block
    }

    /// Parse from string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALLOW" => Some(Action::Allow),
            "VERIFY" => Some(Action::Verify),
            "BLOCK" => Some(Action::Block),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Verify => "VERIFY",
            Action::Block => "BLOCK",
            Action::Unknown => "UNKNOWN",
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Allow
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk band derived from the fraud score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
