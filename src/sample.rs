//! Labelled samples for two-group comparisons
//!
//! A `Sample` is the ordered set of metric values observed in one group of
//! the experiment. It carries no identity beyond its group label and is not
//! mutated after construction.

use crate::error::{Result, SelectorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Experiment arm a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Existing behaviour (e.g. maximum bidding)
    Control,
    /// Candidate behaviour (e.g. average bidding)
    Test,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Control => "control",
            Group::Test => "test",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "control" => Ok(Group::Control),
            "test" => Ok(Group::Test),
            other => Err(format!(
                "unknown group label '{}' (expected 'control' or 'test')",
                other
            )),
        }
    }
}

/// Metric values observed in one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    group: Group,
    values: Vec<f64>,
}

impl Sample {
    /// Wrap already-cleaned values. Validation happens at evaluation time.
    pub fn new(group: Group, values: Vec<f64>) -> Self {
        Self { group, values }
    }

    pub fn control(values: Vec<f64>) -> Self {
        Self::new(Group::Control, values)
    }

    pub fn test(values: Vec<f64>) -> Self {
        Self::new(Group::Test, values)
    }

    /// Build a sample from a column with missing cells, dropping the gaps
    pub fn from_optional(group: Group, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self::new(group, values.into_iter().flatten().collect())
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Check the preconditions every primitive relies on
    ///
    /// Fails on an empty sample, on fewer than `min_len` observations and on
    /// any NaN or infinite value.
    pub fn validate(&self, min_len: usize) -> Result<()> {
        if self.values.is_empty() {
            return Err(SelectorError::invalid_input(self.group, "sample is empty"));
        }

        if self.values.len() < min_len {
            return Err(SelectorError::invalid_input(
                self.group,
                format!(
                    "need at least {} observations for the normality test, got {}",
                    min_len,
                    self.values.len()
                ),
            ));
        }

        if let Some(pos) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(SelectorError::invalid_input(
                self.group,
                format!(
                    "non-finite value {} at position {}",
                    self.values[pos], pos
                ),
            ));
        }

        Ok(())
    }
}
