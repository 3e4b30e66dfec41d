//! Rendering of selector results for the terminal and for machines

use crate::describe::TableSummary;
use crate::hypothesis::{AssumptionResult, SelectorConfig, TestResult, VariancePolicy};
use anyhow::{Context, Result};
use serde::Serialize;

/// Human-readable verdict with the assumption checks that led to it
pub fn render_text(result: &TestResult, config: &SelectorConfig) -> String {
    let mut report = String::new();

    if result.reject_null {
        report.push_str(&format!(
            "❌ H0 REJECTED: significant difference between control and test (p={:.4} < {})\n\n",
            result.p_value, result.alpha
        ));
    } else {
        report.push_str(&format!(
            "✅ H0 NOT REJECTED: no significant difference between control and test (p={:.4})\n\n",
            result.p_value
        ));
    }

    report.push_str(&format!("Method: {}\n", result.method));
    report.push_str(&format!("Test: {}\n", result.kind));
    match result.df {
        Some(df) => report.push_str(&format!(
            "Statistic: {:.4} (df={:.2})\n",
            result.statistic, df
        )),
        None => report.push_str(&format!("Statistic: {:.4}\n", result.statistic)),
    }
    report.push_str(&format!(
        "Significance level: {} ({}% confidence)\n",
        result.alpha,
        (1.0 - result.alpha) * 100.0
    ));

    report.push_str("\n📊 Assumption Checks:\n");
    report.push_str(&check_line(
        "Normality (Shapiro-Wilk), control",
        "W",
        &result.normality.control,
        "normal",
        "not normal",
    ));
    report.push_str(&check_line(
        "Normality (Shapiro-Wilk), test",
        "W",
        &result.normality.test,
        "normal",
        "not normal",
    ));

    match &result.variance {
        Some(variance) => {
            report.push_str(&check_line(
                "Equal variances (Levene)",
                "F",
                variance,
                "equal",
                "unequal",
            ));
            if config.variance_policy == VariancePolicy::AssumeEqual {
                report.push_str("  Variances pooled regardless of Levene (assume_equal policy)\n");
            }
        }
        None => report.push_str("  Equal variances: skipped (normality rejected)\n"),
    }

    report
}

fn check_line(
    label: &str,
    symbol: &str,
    check: &AssumptionResult,
    holds: &str,
    fails: &str,
) -> String {
    format!(
        "  {}: {}={:.4}, p={:.4} -> {}\n",
        label,
        symbol,
        check.statistic,
        check.p_value,
        if check.holds() { holds } else { fails }
    )
}

/// JSON document printed by `--format json`
///
/// Always carries all three keys; `summaries` is empty unless descriptive
/// statistics were requested.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub metric: &'a str,
    pub summaries: &'a [TableSummary],
    pub result: &'a TestResult,
}

/// Pretty-printed JSON envelope of the result and any group summaries
pub fn render_json(metric: &str, summaries: &[TableSummary], result: &TestResult) -> Result<String> {
    let report = JsonReport {
        metric,
        summaries,
        result,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize test result")
}
