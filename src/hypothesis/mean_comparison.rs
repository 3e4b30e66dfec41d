// Two-sample t-tests (Student and Welch)
//
// The statistic is oriented as first-minus-second: swapping the samples
// flips its sign and leaves the two-sided p-value unchanged.

use crate::error::{Result, SelectorError};
use crate::hypothesis::common_scale;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

const TEST_NAME: &str = "t-test";

/// Result of an independent two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// t-statistic, (mean₁ - mean₂) / SE
    pub statistic: f64,

    /// Two-sided p-value
    pub pvalue: f64,

    /// Degrees of freedom (fractional under Welch)
    pub df: f64,

    /// mean₁ - mean₂
    pub mean_difference: f64,
}

/// Independent two-sample t-test
///
/// H₀: μ₁ = μ₂, H₁: μ₁ ≠ μ₂
///
/// * `equal_var = true` pools the variances (Student, df = n₁ + n₂ - 2)
/// * `equal_var = false` uses Welch's standard error and the
///   Welch-Satterthwaite degrees of freedom
///
/// Fails when the standard error is zero, i.e. both samples are constant.
///
/// # Example
/// ```
/// use abselect::hypothesis::mean_comparison::ttest_ind;
///
/// let control = [500.0, 510.0, 520.0, 505.0, 515.0];
/// let test = [560.0, 570.0, 580.0, 565.0, 575.0];
/// let result = ttest_ind(&control, &test, true).unwrap();
/// assert!((result.statistic + 12.0).abs() < 1e-9);
/// assert!(result.pvalue < 0.05);
/// ```
pub fn ttest_ind(sample1: &[f64], sample2: &[f64], equal_var: bool) -> Result<TTestResult> {
    let n1 = sample1.len();
    let n2 = sample2.len();
    if n1 < 2 || n2 < 2 {
        return Err(SelectorError::primitive(
            TEST_NAME,
            format!(
                "each sample needs at least 2 observations, got {} and {}",
                n1, n2
            ),
        ));
    }

    // t is scale invariant; squares of raw values overflow near 1e154
    let scale = common_scale(&[sample1, sample2]);
    let (mean1, var1) = mean_and_variance(sample1, scale);
    let (mean2, var2) = mean_and_variance(sample2, scale);
    let (n1f, n2f) = (n1 as f64, n2 as f64);

    let (se, df) = if equal_var {
        let pooled = ((n1f - 1.0) * var1 + (n2f - 1.0) * var2) / (n1f + n2f - 2.0);
        let se = (pooled * (1.0 / n1f + 1.0 / n2f)).sqrt();
        (se, n1f + n2f - 2.0)
    } else {
        let v1 = var1 / n1f;
        let v2 = var2 / n2f;
        let se = (v1 + v2).sqrt();
        let df = (v1 + v2).powi(2) / (v1.powi(2) / (n1f - 1.0) + v2.powi(2) / (n2f - 1.0));
        (se, df)
    };

    if !se.is_finite() || se <= 0.0 {
        return Err(SelectorError::primitive(
            TEST_NAME,
            format!("standard error is {} (both samples constant?)", se),
        ));
    }

    let statistic = (mean1 - mean2) / se;
    let mean_difference = (mean1 - mean2) * scale;

    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| SelectorError::primitive(TEST_NAME, e.to_string()))?;
    let pvalue = (2.0 * t_dist.sf(statistic.abs())).clamp(0.0, 1.0);

    Ok(TTestResult {
        statistic,
        pvalue,
        df,
        mean_difference,
    })
}

// Mean and unbiased (n - 1) variance of values / scale
fn mean_and_variance(values: &[f64], scale: f64) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().map(|v| v / scale).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|v| (v / scale - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    (mean, var)
}
