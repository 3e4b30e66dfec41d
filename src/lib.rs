//! abselect - hypothesis-test selection for A/B experiments
//!
//! Given the control and test observations of one metric, checks normality of
//! each group and homogeneity of variance, then runs the matching two-sample
//! test: Student's t, Welch's t or Mann-Whitney U. Data loading, descriptive
//! summaries and report rendering back the `abselect` command-line tool.

pub mod cli;
pub mod dataset;
pub mod describe;
pub mod error;
pub mod hypothesis;
pub mod report;
pub mod sample;

pub use error::{Result, SelectorError};
