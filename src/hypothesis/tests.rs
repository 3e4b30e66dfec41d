// Scenario tests for the selection cascade
//
// Real-data scenarios pin down which branch the classical primitives take;
// the scripted suite pins down the branching itself, independent of any
// numerical routine.

use super::*;
use crate::error::SelectorError;
use crate::sample::{Group, Sample};
use std::cell::RefCell;

fn control() -> Sample {
    Sample::control(vec![500.0, 510.0, 520.0, 505.0, 515.0])
}

fn test_group() -> Sample {
    Sample::test(vec![560.0, 570.0, 580.0, 565.0, 575.0])
}

/// Bidding campaign scenario: both groups normal, same spread, clear lift
#[test]
fn test_bidding_lift_selects_student_and_rejects() {
    let result = evaluate(&control(), &test_group(), 0.05).unwrap();

    assert_eq!(result.method, Method::Parametric);
    assert_eq!(result.kind, TestKind::StudentT);
    assert!(result.p_value < 0.05);
    assert!(result.reject_null);
    assert!(result.statistic < 0.0, "control mean is lower");
    assert_eq!(result.df, Some(8.0));

    assert!(!result.normality.control.rejected);
    assert!(!result.normality.test.rejected);
    let variance = result.variance.expect("parametric path runs Levene");
    assert!(!variance.rejected);
}

/// Same means, tenfold spread difference: Levene rejects, Welch is used
#[test]
fn test_unequal_spread_selects_welch() {
    let narrow = Sample::control(vec![8.0, 9.0, 10.0, 11.0, 12.0]);
    let wide = Sample::test(vec![-10.0, 0.0, 10.0, 20.0, 30.0]);

    let result = evaluate(&narrow, &wide, 0.05).unwrap();

    assert_eq!(result.kind, TestKind::WelchT);
    assert_eq!(result.method, Method::Parametric);
    assert!(result.variance.unwrap().rejected);
    assert_eq!(result.statistic, 0.0);
    assert!(!result.reject_null);
}

/// Pooling policy ignores the Levene verdict
#[test]
fn test_assume_equal_policy_pools_despite_levene() {
    let narrow = Sample::control(vec![8.0, 9.0, 10.0, 11.0, 12.0]);
    let wide = Sample::test(vec![-10.0, 0.0, 10.0, 20.0, 30.0]);
    let config = SelectorConfig {
        variance_policy: VariancePolicy::AssumeEqual,
        ..SelectorConfig::default()
    };

    let result = TestSelector::new(config).unwrap().evaluate(&narrow, &wide).unwrap();

    assert_eq!(result.kind, TestKind::StudentT);
    assert!(result.variance.unwrap().rejected, "Levene still reported");
    assert_eq!(result.df, Some(8.0));
}

/// A heavy outlier breaks normality: rank test, no variance check
#[test]
fn test_outlier_selects_mann_whitney() {
    let skewed = Sample::control(vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0]);
    let spread = Sample::test(vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);

    let result = evaluate(&skewed, &spread, 0.05).unwrap();

    assert_eq!(result.method, Method::Nonparametric);
    assert_eq!(result.kind, TestKind::MannWhitneyU);
    assert!(result.normality.control.rejected);
    assert!(result.variance.is_none());
    assert!(result.df.is_none());
    assert_eq!(result.statistic, 10.0);
    assert!(result.reject_null);
}

#[test]
fn test_similar_groups_do_not_reject() {
    let a = Sample::control(vec![10.0, 12.0, 11.0, 13.0, 10.0, 12.0]);
    let b = Sample::test(vec![11.0, 13.0, 10.0, 12.0, 11.0, 12.5]);

    let result = evaluate(&a, &b, 0.05).unwrap();
    assert!(!result.reject_null);
    assert!(result.p_value >= 0.05);
}

#[test]
fn test_swapping_groups_flips_t_sign_only() {
    let forward = evaluate(&control(), &test_group(), 0.05).unwrap();
    let backward = evaluate(
        &Sample::control(test_group().values().to_vec()),
        &Sample::test(control().values().to_vec()),
        0.05,
    )
    .unwrap();

    assert_eq!(forward.kind, backward.kind);
    assert!((forward.statistic + backward.statistic).abs() < 1e-12);
    assert!((forward.p_value - backward.p_value).abs() < 1e-15);
}

#[test]
fn test_two_observations_is_invalid_input() {
    let short = Sample::test(vec![560.0, 570.0]);
    let err = evaluate(&control(), &short, 0.05).unwrap_err();

    match err {
        SelectorError::InvalidInput { group, .. } => assert_eq!(group, Group::Test),
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_empty_and_non_finite_are_invalid_input() {
    let empty = Sample::control(vec![]);
    assert!(evaluate(&empty, &test_group(), 0.05)
        .unwrap_err()
        .is_invalid_input());

    let with_nan = Sample::control(vec![500.0, f64::NAN, 520.0, 505.0]);
    assert!(evaluate(&with_nan, &test_group(), 0.05)
        .unwrap_err()
        .is_invalid_input());
}

/// A constant group degenerates to W = 1 instead of failing
#[test]
fn test_constant_group_does_not_fail() {
    let flat = Sample::control(vec![5.0, 5.0, 5.0, 5.0, 5.0]);
    let ramp = Sample::test(vec![4.0, 5.0, 6.0, 7.0, 8.0]);

    let result = evaluate(&flat, &ramp, 0.05).unwrap();
    assert_eq!(result.normality.control.statistic, 1.0);
    assert_eq!(result.normality.control.p_value, 1.0);
    assert_eq!(result.method, Method::Parametric);
    assert_eq!(result.reject_null, result.p_value < 0.05);
}

/// Finite values near the top of the f64 range still go through every step
#[test]
fn test_extreme_magnitudes_complete_the_cascade() {
    let wide = Sample::control(vec![1e300, -1e300, 0.0, 5e299]);
    let small = Sample::test(vec![1.0, 2.0, 3.0, 4.0]);

    let result = evaluate(&wide, &small, 0.05).unwrap();
    assert!((0.0..=1.0).contains(&result.p_value));
    assert!(result.normality.control.statistic < 1.0);
}

#[test]
fn test_extreme_outlier_still_breaks_normality() {
    let mut values = vec![1e160; 9];
    values.push(50e160);
    let skewed = Sample::control(values);
    let spread = Sample::test((2..=11).map(|v| v as f64 * 1e160).collect());

    let result = evaluate(&skewed, &spread, 0.05).unwrap();
    assert!(result.normality.control.rejected);
    assert_eq!(result.kind, TestKind::MannWhitneyU);
    assert_eq!(result.statistic, 10.0);
}

// ============================================================================
// Scripted primitives
// ============================================================================

/// Returns fixed p-values and records which primitives ran
struct ScriptedSuite {
    normality_p: [f64; 2],
    variance_p: f64,
    fail_rank: bool,
    calls: RefCell<Vec<String>>,
}

impl ScriptedSuite {
    fn new(normality_p: [f64; 2], variance_p: f64) -> Self {
        Self {
            normality_p,
            variance_p,
            fail_rank: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl TestSuite for ScriptedSuite {
    fn normality_test(&self, _sample: &[f64]) -> crate::error::Result<PrimitiveOutcome> {
        let mut calls = self.calls.borrow_mut();
        let index = calls.iter().filter(|c| c.as_str() == "normality").count();
        calls.push("normality".to_string());
        Ok(PrimitiveOutcome::new(0.9, self.normality_p[index.min(1)]))
    }

    fn variance_homogeneity_test(
        &self,
        _a: &[f64],
        _b: &[f64],
    ) -> crate::error::Result<PrimitiveOutcome> {
        self.calls.borrow_mut().push("variance".to_string());
        Ok(PrimitiveOutcome::new(1.5, self.variance_p))
    }

    fn mean_comparison_test(
        &self,
        _a: &[f64],
        _b: &[f64],
        equal_variance: bool,
    ) -> crate::error::Result<PrimitiveOutcome> {
        self.calls
            .borrow_mut()
            .push(format!("t(equal_variance={})", equal_variance));
        Ok(PrimitiveOutcome::new(-2.5, 0.03).with_df(7.5))
    }

    fn rank_test(&self, _a: &[f64], _b: &[f64]) -> crate::error::Result<PrimitiveOutcome> {
        self.calls.borrow_mut().push("rank".to_string());
        if self.fail_rank {
            return Err(SelectorError::Primitive {
                test: "scripted rank",
                message: "did not converge".to_string(),
            });
        }
        Ok(PrimitiveOutcome::new(12.0, 0.2))
    }
}

fn scripted(suite: ScriptedSuite) -> TestSelector<ScriptedSuite> {
    TestSelector::with_suite(SelectorConfig::default(), suite).unwrap()
}

#[test]
fn test_scripted_both_normal_equal_variance() {
    let selector = scripted(ScriptedSuite::new([0.4, 0.6], 0.3));
    let result = selector.evaluate(&control(), &test_group()).unwrap();

    assert_eq!(
        selector.suite().calls(),
        vec!["normality", "normality", "variance", "t(equal_variance=true)"]
    );
    assert_eq!(result.kind, TestKind::StudentT);
    assert_eq!(result.df, Some(7.5));
    assert!(result.reject_null);
}

#[test]
fn test_scripted_unequal_variance_requests_welch() {
    let selector = scripted(ScriptedSuite::new([0.4, 0.6], 0.01));
    let result = selector.evaluate(&control(), &test_group()).unwrap();

    assert_eq!(
        selector.suite().calls(),
        vec!["normality", "normality", "variance", "t(equal_variance=false)"]
    );
    assert_eq!(result.kind, TestKind::WelchT);
}

#[test]
fn test_scripted_second_group_not_normal_skips_variance() {
    let selector = scripted(ScriptedSuite::new([0.4, 0.001], 0.9));
    let result = selector.evaluate(&control(), &test_group()).unwrap();

    assert_eq!(selector.suite().calls(), vec!["normality", "normality", "rank"]);
    assert_eq!(result.method, Method::Nonparametric);
    assert!(!result.normality.control.rejected);
    assert!(result.normality.test.rejected);
    assert!(!result.reject_null);
}

#[test]
fn test_scripted_boundary_pvalue_counts_as_normal() {
    // p == alpha does not reject
    let selector = scripted(ScriptedSuite::new([0.05, 0.05], 0.05));
    let result = selector.evaluate(&control(), &test_group()).unwrap();
    assert_eq!(result.kind, TestKind::StudentT);
}

#[test]
fn test_scripted_nan_normality_falls_back_to_rank() {
    let selector = scripted(ScriptedSuite::new([f64::NAN, 0.5], 0.5));
    let result = selector.evaluate(&control(), &test_group()).unwrap();
    assert_eq!(result.kind, TestKind::MannWhitneyU);
}

#[test]
fn test_scripted_primitive_error_propagates_unchanged() {
    let mut suite = ScriptedSuite::new([0.001, 0.5], 0.5);
    suite.fail_rank = true;
    let selector = scripted(suite);

    let err = selector.evaluate(&control(), &test_group()).unwrap_err();
    match err {
        SelectorError::Primitive { test, message } => {
            assert_eq!(test, "scripted rank");
            assert_eq!(message, "did not converge");
        }
        other => panic!("expected Primitive error, got {:?}", other),
    }
}

#[test]
fn test_scripted_invalid_input_checked_before_primitives() {
    let selector = scripted(ScriptedSuite::new([0.5, 0.5], 0.5));
    let short = Sample::control(vec![1.0, 2.0]);

    assert!(selector.evaluate(&short, &test_group()).is_err());
    assert!(selector.suite().calls().is_empty());
}
