// Statistical primitives consumed by the selector
//
// The selector only needs (statistic, p-value) pairs from four routines.
// `TestSuite` is that seam; `ClassicalSuite` wires it to Shapiro-Wilk,
// Levene, Student/Welch and Mann-Whitney.

use crate::error::Result;
use crate::hypothesis::config::{LeveneCenter, SelectorConfig};
use crate::hypothesis::mean_comparison::ttest_ind;
use crate::hypothesis::normality::shapiro_wilk;
use crate::hypothesis::rank::{mann_whitney_u, RankOptions};
use crate::hypothesis::variance::levene;
use serde::{Deserialize, Serialize};

/// Outcome of one primitive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveOutcome {
    pub statistic: f64,
    pub p_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub df: Option<f64>,
}

impl PrimitiveOutcome {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value,
            df: None,
        }
    }

    pub fn with_df(mut self, df: f64) -> Self {
        self.df = Some(df);
        self
    }
}

/// The four statistical routines the selector depends on
///
/// Errors returned here reach the caller of `evaluate` unchanged.
pub trait TestSuite {
    /// H₀: the sample is normally distributed
    fn normality_test(&self, sample: &[f64]) -> Result<PrimitiveOutcome>;

    /// H₀: both samples have the same variance
    fn variance_homogeneity_test(&self, a: &[f64], b: &[f64]) -> Result<PrimitiveOutcome>;

    /// H₀: both samples have the same mean
    fn mean_comparison_test(
        &self,
        a: &[f64],
        b: &[f64],
        equal_variance: bool,
    ) -> Result<PrimitiveOutcome>;

    /// H₀: both samples come from the same distribution
    fn rank_test(&self, a: &[f64], b: &[f64]) -> Result<PrimitiveOutcome>;
}

/// Shapiro-Wilk, Levene, Student/Welch t and Mann-Whitney U
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicalSuite {
    pub levene_center: LeveneCenter,
    pub rank_options: RankOptions,
}

impl Default for ClassicalSuite {
    fn default() -> Self {
        Self::from_config(&SelectorConfig::default())
    }
}

impl ClassicalSuite {
    pub fn from_config(config: &SelectorConfig) -> Self {
        Self {
            levene_center: config.levene_center,
            rank_options: RankOptions {
                continuity_correction: config.continuity_correction,
                exact_max: config.exact_rank_max,
            },
        }
    }
}

impl TestSuite for ClassicalSuite {
    fn normality_test(&self, sample: &[f64]) -> Result<PrimitiveOutcome> {
        let result = shapiro_wilk(sample)?;
        Ok(PrimitiveOutcome::new(result.w, result.pvalue))
    }

    fn variance_homogeneity_test(&self, a: &[f64], b: &[f64]) -> Result<PrimitiveOutcome> {
        let result = levene(&[a, b], self.levene_center)?;
        Ok(PrimitiveOutcome::new(result.statistic, result.pvalue))
    }

    fn mean_comparison_test(
        &self,
        a: &[f64],
        b: &[f64],
        equal_variance: bool,
    ) -> Result<PrimitiveOutcome> {
        let result = ttest_ind(a, b, equal_variance)?;
        Ok(PrimitiveOutcome::new(result.statistic, result.pvalue).with_df(result.df))
    }

    fn rank_test(&self, a: &[f64], b: &[f64]) -> Result<PrimitiveOutcome> {
        let result = mann_whitney_u(a, b, self.rank_options)?;
        Ok(PrimitiveOutcome::new(result.u, result.pvalue))
    }
}
