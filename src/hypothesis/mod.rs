// Two-group hypothesis-test selection
//
// Decides between a parametric and a rank-based comparison of two samples
// by checking the parametric test's assumptions first:
// - normality of each group (Shapiro-Wilk)
// - homogeneity of variance (Levene, median-centered by default)
// - Student or Welch t-test when both groups look normal
// - Mann-Whitney U otherwise
//
// Each primitive lives in its own module and is reachable through the
// `TestSuite` trait, so the decision logic can run against any statistics
// backend.

pub mod config;
pub mod mean_comparison;
pub mod normality;
pub mod rank;
mod selector;
mod suite;
pub mod variance;

pub use config::{LeveneCenter, SelectorConfig, VariancePolicy, EXACT_RANK_LIMIT};
pub use selector::{
    evaluate, AssumptionResult, Method, NormalityChecks, TestKind, TestResult, TestSelector,
};
pub use suite::{ClassicalSuite, PrimitiveOutcome, TestSuite};

// Power of two at or just below the largest |v| over all groups; 1.0 when
// every value is zero. Every statistic here is scale invariant, and dividing
// by a power of two is exact, so results match the unscaled computation while
// squares and sums stay finite for any finite input.
pub(crate) fn common_scale(groups: &[&[f64]]) -> f64 {
    let max_abs = groups
        .iter()
        .flat_map(|g| g.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if max_abs > 0.0 && max_abs.is_finite() {
        let exponent = max_abs.log2().floor().clamp(-1000.0, 1023.0) as i32;
        2.0_f64.powi(exponent)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests;
