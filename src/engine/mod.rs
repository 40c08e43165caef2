pub mod action;
pub mod decision;
pub mod store;

pub use action::{ActionProcessor, ActionResponse, ResponseStatus};
pub use decision::DecisionEngine;
pub use store::{PolicySnapshot, ThresholdInfo, ThresholdStore};
