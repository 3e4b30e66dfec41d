// Shapiro-Wilk normality test
//
// Coefficients and p-values follow Royston's approximation (AS R94):
// - Blom scores for the expected normal order statistics
// - polynomial corrections for the two most extreme coefficients
// - log-normal transform of 1 - W, split at n = 11
//
// References:
// - Shapiro, S. S. & Wilk, M. B. (1965). An analysis of variance test for
//   normality (complete samples). Biometrika 52, 591-611.
// - Royston, P. (1995). Remark AS R94. Applied Statistics 44, 547-551.

use crate::error::{Result, SelectorError};
use crate::hypothesis::common_scale;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

const TEST_NAME: &str = "Shapiro-Wilk";

/// Largest n for which Royston's p-value approximation was fitted
pub const SHAPIRO_MAX_N: usize = 5000;

// Royston polynomial coefficients, lowest order first
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Result of a Shapiro-Wilk test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilkResult {
    /// W statistic in (0, 1]; values near 1 indicate normality
    pub w: f64,

    /// Probability of a W at least this small under normality
    pub pvalue: f64,
}

/// Test whether a sample was drawn from a normal distribution
///
/// H₀: the sample comes from a normal population.
///
/// A constant sample has no spread to test; it returns `W = 1, p = 1`
/// rather than failing.
///
/// # Example
/// ```
/// use abselect::hypothesis::normality::shapiro_wilk;
///
/// let result = shapiro_wilk(&[500.0, 510.0, 520.0, 505.0, 515.0]).unwrap();
/// assert!(result.pvalue > 0.05);
/// ```
pub fn shapiro_wilk(sample: &[f64]) -> Result<ShapiroWilkResult> {
    let n = sample.len();
    if n < 3 {
        return Err(SelectorError::primitive(
            TEST_NAME,
            format!("need at least 3 observations, got {}", n),
        ));
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(SelectorError::primitive(TEST_NAME, "sample contains non-finite values"));
    }
    if n > SHAPIRO_MAX_N {
        tracing::warn!(
            "Shapiro-Wilk p-value is approximate for n > {} (n = {})",
            SHAPIRO_MAX_N,
            n
        );
    }

    // W is scale invariant; working on x / max|x| keeps b² and SS finite
    // for any finite input
    let scale = common_scale(&[sample]);
    let mut x: Vec<f64> = sample.iter().map(|v| v / scale).collect();
    x.sort_by(f64::total_cmp);

    let range = x[n - 1] - x[0];
    if range <= f64::EPSILON {
        tracing::warn!("Shapiro-Wilk input has zero range; treating as W = 1");
        return Ok(ShapiroWilkResult { w: 1.0, pvalue: 1.0 });
    }

    if n == 3 {
        return Ok(three_point(&x));
    }

    let normal = standard_normal()?;
    let a = coefficients(&normal, n)?;
    let w = w_statistic(&x, &a);
    if !w.is_finite() {
        return Err(SelectorError::primitive(
            TEST_NAME,
            format!("W statistic is {} (n = {})", w, n),
        ));
    }
    let w = w.min(1.0);
    let pvalue = w_pvalue(&normal, w, n);

    Ok(ShapiroWilkResult {
        w,
        pvalue: pvalue.clamp(0.0, 1.0),
    })
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| SelectorError::primitive(TEST_NAME, e.to_string()))
}

// n = 3 has a closed form: a = (√½, 0, -√½) and an exact p-value
fn three_point(x: &[f64]) -> ShapiroWilkResult {
    let mean = x.iter().sum::<f64>() / 3.0;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let b = FRAC_1_SQRT_2 * (x[2] - x[0]);
    let w = (b * b / ss).clamp(0.75, 1.0);
    let pvalue = 1.0 - (6.0 / PI) * w.sqrt().acos();

    ShapiroWilkResult {
        w,
        pvalue: pvalue.clamp(0.0, 1.0),
    }
}

// Horner evaluation, coefficients lowest order first
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

// Antisymmetric weights for the lower half; a[i] pairs x[i] with x[n-1-i]
fn coefficients(normal: &Normal, n: usize) -> Result<Vec<f64>> {
    let nn2 = n / 2;
    let an = n as f64;

    let m: Vec<f64> = (1..=nn2)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; nn2];
    a[0] = a1;

    let (first_free, fac_num, fac_den) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        (
            2,
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    } else {
        (1, summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    };

    if fac_num <= 0.0 || fac_den <= 0.0 {
        return Err(SelectorError::primitive(
            TEST_NAME,
            format!("coefficient normalisation failed for n = {}", n),
        ));
    }
    let fac = (fac_num / fac_den).sqrt();
    for i in first_free..nn2 {
        a[i] = -m[i] / fac;
    }

    Ok(a)
}

fn w_statistic(x: &[f64], a: &[f64]) -> f64 {
    let n = x.len();
    let b: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();

    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();

    b * b / ss
}

fn w_pvalue(normal: &Normal, w: f64, n: usize) -> f64 {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }

    let an = n as f64;
    let y = w1.ln();

    let (z_input, m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return 0.0;
        }
        (-(gamma - y).ln(), poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (y, poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    normal.sf((z_input - m) / s)
}
