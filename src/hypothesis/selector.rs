// Hypothesis-test selection for two-group experiments
//
// Decision cascade, each step terminal once a method is chosen:
// 1. Shapiro-Wilk on each group
// 2. both normal  -> Levene -> Student (equal variances) or Welch
// 3. either not normal -> Mann-Whitney U
//
// Every reject decision uses the same rule: p < alpha.

use crate::error::Result;
use crate::hypothesis::config::{SelectorConfig, VariancePolicy};
use crate::hypothesis::suite::{ClassicalSuite, PrimitiveOutcome, TestSuite};
use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an assumption check (normality or equal variance)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssumptionResult {
    pub statistic: f64,
    pub p_value: f64,
    /// True when the assumption's null hypothesis is rejected (p < alpha)
    pub rejected: bool,
}

impl AssumptionResult {
    pub fn new(statistic: f64, p_value: f64, alpha: f64) -> Self {
        Self {
            statistic,
            p_value,
            rejected: rejects(p_value, alpha),
        }
    }

    fn from_outcome(outcome: PrimitiveOutcome, alpha: f64) -> Self {
        Self::new(outcome.statistic, outcome.p_value, alpha)
    }

    /// The assumption can be relied on. A NaN p-value never holds.
    pub fn holds(&self) -> bool {
        !self.rejected && !self.p_value.is_nan()
    }
}

/// Family of the final mean-comparison test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Parametric,
    Nonparametric,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Parametric => write!(f, "parametric"),
            Method::Nonparametric => write!(f, "nonparametric"),
        }
    }
}

/// The concrete test that produced the final statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Pooled-variance two-sample t-test
    StudentT,
    /// Unequal-variance two-sample t-test
    WelchT,
    /// Rank-sum test
    MannWhitneyU,
}

impl TestKind {
    pub fn method(&self) -> Method {
        match self {
            TestKind::StudentT | TestKind::WelchT => Method::Parametric,
            TestKind::MannWhitneyU => Method::Nonparametric,
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::StudentT => write!(f, "Student's t-test (equal variances)"),
            TestKind::WelchT => write!(f, "Welch's t-test (unequal variances)"),
            TestKind::MannWhitneyU => write!(f, "Mann-Whitney U test"),
        }
    }
}

/// Normality checks for both groups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityChecks {
    pub control: AssumptionResult,
    pub test: AssumptionResult,
}

impl NormalityChecks {
    pub fn both_hold(&self) -> bool {
        self.control.holds() && self.test.holds()
    }
}

/// Final decision of the selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub method: Method,
    pub kind: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    /// Degrees of freedom of the t-test; absent for rank tests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub df: Option<f64>,
    /// p_value < alpha
    pub reject_null: bool,
    pub alpha: f64,
    pub normality: NormalityChecks,
    /// Only computed on the parametric path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<AssumptionResult>,
}

/// Picks and runs the two-sample test appropriate for the data
///
/// # Example
/// ```
/// use abselect::hypothesis::{Method, SelectorConfig, TestSelector};
/// use abselect::sample::Sample;
///
/// let selector = TestSelector::new(SelectorConfig::default()).unwrap();
/// let control = Sample::control(vec![500.0, 510.0, 520.0, 505.0, 515.0]);
/// let test = Sample::test(vec![560.0, 570.0, 580.0, 565.0, 575.0]);
///
/// let result = selector.evaluate(&control, &test).unwrap();
/// assert_eq!(result.method, Method::Parametric);
/// assert!(result.reject_null);
/// ```
#[derive(Debug, Clone)]
pub struct TestSelector<S = ClassicalSuite> {
    config: SelectorConfig,
    suite: S,
}

impl TestSelector<ClassicalSuite> {
    /// Selector backed by the classical primitives
    pub fn new(config: SelectorConfig) -> Result<Self> {
        let suite = ClassicalSuite::from_config(&config);
        Self::with_suite(config, suite)
    }
}

impl<S: TestSuite> TestSelector<S> {
    /// Selector backed by a caller-supplied set of primitives
    pub fn with_suite(config: SelectorConfig, suite: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, suite })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn suite(&self) -> &S {
        &self.suite
    }

    /// Run the normality -> variance -> test cascade
    ///
    /// Both samples are validated first: empty input, fewer than
    /// `min_sample_size` observations or non-finite values fail with
    /// `SelectorError::InvalidInput` before any test runs.
    pub fn evaluate(&self, control: &Sample, test: &Sample) -> Result<TestResult> {
        let alpha = self.config.significance_level;

        control.validate(self.config.min_sample_size)?;
        test.validate(self.config.min_sample_size)?;

        let (a, b) = (control.values(), test.values());

        let normality = NormalityChecks {
            control: AssumptionResult::from_outcome(self.suite.normality_test(a)?, alpha),
            test: AssumptionResult::from_outcome(self.suite.normality_test(b)?, alpha),
        };
        tracing::debug!(
            "Normality: {} p = {:.4}, {} p = {:.4}",
            control.group(),
            normality.control.p_value,
            test.group(),
            normality.test.p_value
        );

        if !normality.both_hold() {
            tracing::debug!("Normality rejected; using rank test");
            let outcome = self.suite.rank_test(a, b)?;
            return Ok(self.finish(TestKind::MannWhitneyU, outcome, normality, None));
        }

        let variance =
            AssumptionResult::from_outcome(self.suite.variance_homogeneity_test(a, b)?, alpha);
        let equal_variance = match self.config.variance_policy {
            VariancePolicy::Levene => variance.holds(),
            VariancePolicy::AssumeEqual => true,
        };
        tracing::debug!(
            "Levene p = {:.4}, pooling variances: {}",
            variance.p_value,
            equal_variance
        );

        let kind = if equal_variance {
            TestKind::StudentT
        } else {
            TestKind::WelchT
        };
        let outcome = self.suite.mean_comparison_test(a, b, equal_variance)?;

        Ok(self.finish(kind, outcome, normality, Some(variance)))
    }

    fn finish(
        &self,
        kind: TestKind,
        outcome: PrimitiveOutcome,
        normality: NormalityChecks,
        variance: Option<AssumptionResult>,
    ) -> TestResult {
        let alpha = self.config.significance_level;
        TestResult {
            method: kind.method(),
            kind,
            statistic: outcome.statistic,
            p_value: outcome.p_value,
            df: outcome.df,
            reject_null: rejects(outcome.p_value, alpha),
            alpha,
            normality,
            variance,
        }
    }
}

/// Select and run the appropriate two-sample test at significance `alpha`
///
/// # Example
/// ```
/// use abselect::hypothesis::evaluate;
/// use abselect::sample::Sample;
///
/// let control = Sample::control(vec![500.0, 510.0, 520.0, 505.0, 515.0]);
/// let test = Sample::test(vec![560.0, 570.0, 580.0, 565.0, 575.0]);
/// let result = evaluate(&control, &test, 0.05).unwrap();
/// assert!(result.p_value < 0.05);
/// ```
pub fn evaluate(control: &Sample, test: &Sample, alpha: f64) -> Result<TestResult> {
    TestSelector::new(SelectorConfig::with_alpha(alpha))?.evaluate(control, test)
}

fn rejects(p_value: f64, alpha: f64) -> bool {
    p_value < alpha
}
