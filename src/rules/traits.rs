use crate::domain::{Action, Evidence, Transaction};
use std::fmt::Debug;

/// Working state threaded through the business-rule overlay.
///
/// Each rule consumes a draft and returns the next one; reasons and
/// evidence only ever grow.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// Current action
    pub action: Action,

    /// Reasons accumulated so far
    pub reasoning: Vec<String>,

    /// Structured evidence accumulated so far
    pub evidence: Vec<Evidence>,
}

impl Draft {
    /// Start a draft from the threshold-based action.
    pub fn new(action: Action) -> Self {
        Draft {
            action,
            reasoning: Vec::new(),
            evidence: Vec::new(),
        }
    }

    /// Move to a new action, recording why.
    pub fn change(mut self, action: Action, reason: impl Into<String>, evidence: Evidence) -> Self {
        self.action = action;
        self.reasoning.push(reason.into());
        self.evidence.push(evidence);
        self
    }

    /// Record a reason without changing the action.
    pub fn note(mut self, reason: impl Into<String>, evidence: Evidence) -> Self {
        self.reasoning.push(reason.into());
        self.evidence.push(evidence);
        self
    }
}

/// A business rule applied on top of the threshold-based action.
///
/// Rules are pure: the output depends only on the incoming draft and the
/// transaction. They run in a fixed order and later rules see the action
/// left by earlier ones.
pub trait OverlayRule: Send + Sync + Debug {
    /// Unique identifier for this rule.
    fn id(&self) -> &str;

    /// Apply the rule, returning the next draft.
    fn apply(&self, draft: Draft, tx: &Transaction) -> Draft;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[derive(Debug)]
    struct AlwaysVerify;

    impl OverlayRule for AlwaysVerify {
        fn id(&self) -> &str {
            "TEST_ALWAYS_VERIFY"
        }

        fn apply(&self, draft: Draft, _tx: &Transaction) -> Draft {
            draft.change(
                Action::Verify,
                "forced",
                Evidence::new(self.id(), "test", "forced"),
            )
        }
    }

    #[test]
    fn test_overlay_rule_trait() {
        let tx = Transaction::new("S1", "R1", Decimal::new(100, 0), 12);
        let draft = AlwaysVerify.apply(Draft::new(Action::Allow), &tx);

        assert_eq!(draft.action, Action::Verify);
        assert_eq!(draft.reasoning, vec!["forced".to_string()]);
        assert_eq!(draft.evidence[0].rule_id, "TEST_ALWAYS_VERIFY");
    }

    #[test]
    fn test_note_keeps_action() {
        let draft = Draft::new(Action::Block).note("seen", Evidence::new("R", "k", "v"));

        assert_eq!(draft.action, Action::Block);
        assert_eq!(draft.reasoning.len(), 1);
    }
}
