// Levene's test for homogeneity of variance
//
// Runs a one-way ANOVA on the absolute deviations of each observation from
// its group center. With the median as center this is the Brown-Forsythe
// variant, which keeps its size under skewed data.
//
// References:
// - Levene, H. (1960). Robust tests for equality of variances.
// - Brown, M. B. & Forsythe, A. B. (1974). Robust tests for the equality of
//   variances. JASA 69, 364-367.

use crate::error::{Result, SelectorError};
use crate::hypothesis::common_scale;
use crate::hypothesis::config::LeveneCenter;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

const TEST_NAME: &str = "Levene";

/// Result of Levene's test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeveneResult {
    /// W statistic, F-distributed under H₀
    pub statistic: f64,

    /// Upper-tail p-value
    pub pvalue: f64,

    /// k - 1
    pub df_between: usize,

    /// N - k
    pub df_within: usize,
}

/// Test whether all groups share one variance
///
/// H₀: σ₁² = σ₂² = ... = σₖ²
///
/// When every deviation equals its group mean deviation (for example two
/// constant groups) the F ratio is 0/0; identical dispersion then yields
/// `W = 0, p = 1` and differing dispersion `W = ∞, p = 0`.
///
/// # Example
/// ```
/// use abselect::hypothesis::config::LeveneCenter;
/// use abselect::hypothesis::variance::levene;
///
/// let tight = [4.9, 5.0, 5.0, 5.1, 5.0];
/// let wide = [0.0, 3.0, 5.0, 7.0, 10.0];
/// let result = levene(&[&tight, &wide], LeveneCenter::Median).unwrap();
/// assert!(result.pvalue < 0.05);
/// ```
pub fn levene(groups: &[&[f64]], center: LeveneCenter) -> Result<LeveneResult> {
    let k = groups.len();
    if k < 2 {
        return Err(SelectorError::primitive(TEST_NAME, "need at least 2 groups"));
    }
    for (i, group) in groups.iter().enumerate() {
        if group.len() < 2 {
            return Err(SelectorError::primitive(
                TEST_NAME,
                format!("group {} has {} observations, need at least 2", i, group.len()),
            ));
        }
        if group.iter().any(|v| !v.is_finite()) {
            return Err(SelectorError::primitive(
                TEST_NAME,
                format!("group {} contains non-finite values", i),
            ));
        }
    }

    // One scale for all groups leaves W unchanged and keeps |v - c| finite
    let scale = common_scale(groups);
    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|group| {
            let scaled: Vec<f64> = group.iter().map(|v| v / scale).collect();
            let c = match center {
                LeveneCenter::Median => median(&scaled),
                LeveneCenter::Mean => mean(&scaled),
            };
            scaled.iter().map(|v| (v - c).abs()).collect()
        })
        .collect();

    let n_total: usize = deviations.iter().map(Vec::len).sum();
    let group_means: Vec<f64> = deviations.iter().map(|z| mean(z)).collect();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / n_total as f64;

    let ss_between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();

    let df_between = k - 1;
    let df_within = n_total - k;

    if ss_within <= 0.0 {
        let (statistic, pvalue) = if ss_between <= 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY, 0.0)
        };
        tracing::warn!(
            "Levene: zero within-group dispersion, W = {}, p = {}",
            statistic,
            pvalue
        );
        return Ok(LeveneResult {
            statistic,
            pvalue,
            df_between,
            df_within,
        });
    }

    let statistic = (df_within as f64 / df_between as f64) * (ss_between / ss_within);
    if statistic.is_nan() {
        return Err(SelectorError::primitive(
            TEST_NAME,
            format!(
                "statistic is NaN (ss_between = {}, ss_within = {})",
                ss_between, ss_within
            ),
        ));
    }

    let pvalue = if statistic.is_infinite() {
        0.0
    } else {
        let f_dist = FisherSnedecor::new(df_between as f64, df_within as f64)
            .map_err(|e| SelectorError::primitive(TEST_NAME, e.to_string()))?;
        f_dist.sf(statistic).clamp(0.0, 1.0)
    };

    Ok(LeveneResult {
        statistic,
        pvalue,
        df_between,
        df_within,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
