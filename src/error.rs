use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single problem found while validating a transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldProblem {
    /// Offending field name
    pub field: String,
    /// What is wrong with it
    pub reason: String,
}

impl FieldProblem {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldProblem {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        FieldProblem::new(field, "is required")
    }
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Transaction payload failed validation.
///
/// Carries every problem found in one pass, not just the first.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid transaction: {}", join_problems(.problems))]
pub struct ValidationError {
    pub problems: Vec<FieldProblem>,
}

impl ValidationError {
    pub fn new(problems: Vec<FieldProblem>) -> Self {
        ValidationError { problems }
    }

    /// Returns true if the given field has at least one problem.
    pub fn has_field(&self, field: &str) -> bool {
        self.problems.iter().any(|p| p.field == field)
    }
}

fn join_problems(problems: &[FieldProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised by the decision engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionError {
    #[error("fraud score must be a finite number between 0 and 1, got {0}")]
    InvalidScore(f64),
}

/// A threshold update was rejected. The active configuration is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidThresholdError {
    #[error("threshold '{key}' must be a finite number")]
    NotFinite { key: &'static str },

    #[error("threshold '{key}' must be between 0 and 1, got {value}")]
    OutOfRange { key: &'static str, value: f64 },

    #[error("allow threshold ({allow}) must be lower than block threshold ({block})")]
    Ordering { allow: f64, block: f64 },
}

/// Failure inside the prediction pipeline after validation succeeded.
///
/// Never surfaced as-is: the orchestrator turns it into a fail-safe BLOCK.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error("preprocessing failed: {0}")]
    Preprocess(#[source] anyhow::Error),

    #[error("scoring failed: {0}")]
    Scoring(#[source] anyhow::Error),

    #[error("scorer returned a non-finite score: {0}")]
    NonFiniteScore(f64),

    #[error("decision failed: {0}")]
    Decision(#[from] DecisionError),
}
