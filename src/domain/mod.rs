pub mod decision;
pub mod evidence;
pub mod policy;
pub mod record;
pub mod thresholds;
pub mod transaction;

pub use decision::{Action, RiskLevel};
pub use evidence::Evidence;
pub use policy::{in_hour_window, Policy, RuleParams, ThresholdValues};
pub use record::{DecisionId, DecisionRecord};
pub use thresholds::{RiskBand, ThresholdConfig, ThresholdUpdate};
pub use transaction::{RiskSignals, Transaction, TransactionId, UserTier};
