pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod observability;
pub mod orchestrator;
pub mod policy;
pub mod rules;
pub mod scoring;
pub mod testing;

pub use config::Config;
pub use domain::{Action, DecisionRecord, Evidence, RiskLevel, Transaction};
pub use engine::{ActionProcessor, ActionResponse, DecisionEngine, ThresholdStore};
pub use error::{DecisionError, InternalError, InvalidThresholdError, ValidationError};
pub use orchestrator::{Orchestrator, Prediction};
pub use scoring::{Preprocessor, Scorer};
