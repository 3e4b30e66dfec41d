//! Error types for hypothesis-test selection
//!
//! Input problems are reported before any statistical routine runs.
//! Failures inside a primitive (zero standard error, bad distribution
//! parameters) surface as `Primitive` and are never retried.

use crate::sample::Group;
use thiserror::Error;

/// Errors for test selection and the statistical primitives
#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Invalid {group} sample: {reason}")]
    InvalidInput { group: Group, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{test} failed: {message}")]
    Primitive { test: &'static str, message: String },
}

impl SelectorError {
    pub(crate) fn invalid_input(group: Group, reason: impl Into<String>) -> Self {
        SelectorError::InvalidInput {
            group,
            reason: reason.into(),
        }
    }

    pub(crate) fn primitive(test: &'static str, message: impl Into<String>) -> Self {
        SelectorError::Primitive {
            test,
            message: message.into(),
        }
    }

    /// True for precondition violations on the caller's samples
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SelectorError::InvalidInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, SelectorError>;
