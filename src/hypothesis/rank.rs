// Mann-Whitney U test (Wilcoxon rank-sum)
//
// Distribution-free comparison of two independent samples. Tied values share
// the average of the ranks they span (mid-ranks).
//
// p-value method:
// - exact: null distribution of U enumerated via the Gaussian binomial
//   coefficient, used for tie-free samples when the smaller group is small
// - asymptotic: normal approximation with tie-corrected variance and an
//   optional 0.5 continuity correction
//
// Reference: Mann, H. B. & Whitney, D. R. (1947). On a test of whether one of
// two random variables is stochastically larger than the other.

use crate::error::{Result, SelectorError};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

const TEST_NAME: &str = "Mann-Whitney U";

/// How the Mann-Whitney p-value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMethod {
    Exact,
    Asymptotic,
}

/// Options for the Mann-Whitney U test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    /// Apply the 0.5 continuity correction in the normal approximation
    pub continuity_correction: bool,

    /// Use the exact distribution when there are no ties and
    /// min(n₁, n₂) is at most this value
    pub exact_max: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            continuity_correction: true,
            exact_max: 8,
        }
    }
}

/// Result of a Mann-Whitney U test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyResult {
    /// U of the first sample: R₁ - n₁(n₁ + 1) / 2
    pub u: f64,

    /// Two-sided p-value
    pub pvalue: f64,

    pub method: RankMethod,
}

/// Two-sided Mann-Whitney U test
///
/// H₀: the two samples come from the same distribution.
///
/// # Example
/// ```
/// use abselect::hypothesis::rank::{mann_whitney_u, RankOptions};
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let result = mann_whitney_u(&a, &b, RankOptions::default()).unwrap();
/// assert_eq!(result.u, 0.0);
/// assert!(result.pvalue < 0.01);
/// ```
pub fn mann_whitney_u(
    sample1: &[f64],
    sample2: &[f64],
    options: RankOptions,
) -> Result<MannWhitneyResult> {
    let n1 = sample1.len();
    let n2 = sample2.len();
    if n1 == 0 || n2 == 0 {
        return Err(SelectorError::primitive(TEST_NAME, "both samples must be non-empty"));
    }
    if sample1.iter().chain(sample2).any(|v| !v.is_finite()) {
        return Err(SelectorError::primitive(TEST_NAME, "samples contain non-finite values"));
    }

    let ranked = RankedPool::new(sample1, sample2);
    let (n1f, n2f) = (n1 as f64, n2 as f64);

    let u1 = ranked.first_rank_sum - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;
    let u_max = u1.max(u2);

    let use_exact = !ranked.has_ties() && n1.min(n2) <= options.exact_max;

    let (pvalue, method) = if use_exact {
        // U is integral without ties
        let tail = exact_upper_tail(n1, n2, u_max.round() as usize);
        ((2.0 * tail).clamp(0.0, 1.0), RankMethod::Exact)
    } else {
        (
            asymptotic_pvalue(n1f, n2f, u_max, ranked.tie_term, options.continuity_correction)?,
            RankMethod::Asymptotic,
        )
    };

    tracing::debug!(
        "Mann-Whitney U = {} ({:?}, n1 = {}, n2 = {}), p = {}",
        u1,
        method,
        n1,
        n2,
        pvalue
    );

    Ok(MannWhitneyResult {
        u: u1,
        pvalue,
        method,
    })
}

/// Both samples pooled and mid-ranked
struct RankedPool {
    /// Sum of the ranks held by the first sample
    first_rank_sum: f64,
    /// Σ (t³ - t) over tie groups of size t
    tie_term: f64,
}

impl RankedPool {
    fn new(sample1: &[f64], sample2: &[f64]) -> Self {
        let mut pool: Vec<(f64, bool)> = sample1
            .iter()
            .map(|&v| (v, true))
            .chain(sample2.iter().map(|&v| (v, false)))
            .collect();
        pool.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut first_rank_sum = 0.0;
        let mut tie_term = 0.0;
        let mut i = 0;
        while i < pool.len() {
            let mut j = i + 1;
            while j < pool.len() && pool[j].0 == pool[i].0 {
                j += 1;
            }
            // Positions i..j share ranks i+1..=j
            let mid_rank = (i + 1 + j) as f64 / 2.0;
            let in_first = pool[i..j].iter().filter(|(_, first)| *first).count();
            first_rank_sum += mid_rank * in_first as f64;

            let t = (j - i) as f64;
            tie_term += t * t * t - t;
            i = j;
        }

        Self {
            first_rank_sum,
            tie_term,
        }
    }

    fn has_ties(&self) -> bool {
        self.tie_term > 0.0
    }
}

// P(U >= u) under H₀ for tie-free samples of sizes n1, n2.
//
// The number of arrangements with U = k is the coefficient of q^k in the
// Gaussian binomial [n1 + n2 choose m]_q, built as
// Π_{i=1..m} (1 - q^(n+i)) / (1 - q^i) with m = min(n1, n2).
fn exact_upper_tail(n1: usize, n2: usize, u: usize) -> f64 {
    let m = n1.min(n2);
    let n = n1.max(n2);
    let max_u = m * n;
    if u > max_u {
        return 0.0;
    }

    let mut counts = vec![0.0_f64; max_u + 1];
    counts[0] = 1.0;
    for i in 1..=m {
        // multiply by (1 - q^(n+i))
        let shift = n + i;
        for k in (shift..=max_u).rev() {
            counts[k] -= counts[k - shift];
        }
        // divide by (1 - q^i)
        for k in i..=max_u {
            counts[k] += counts[k - i];
        }
    }

    let total: f64 = counts.iter().sum();
    let tail: f64 = counts[u..].iter().sum();
    tail / total
}

fn asymptotic_pvalue(n1: f64, n2: f64, u_max: f64, tie_term: f64, continuity: bool) -> Result<f64> {
    let n = n1 + n2;
    let mu = n1 * n2 / 2.0;
    let tie_adjust = if n > 1.0 { tie_term / (n * (n - 1.0)) } else { 0.0 };
    let sigma_sq = n1 * n2 / 12.0 * ((n + 1.0) - tie_adjust);

    if sigma_sq <= 0.0 {
        // Every observation tied: no evidence of a shift
        return Ok(1.0);
    }

    let mut numerator = u_max - mu;
    if continuity {
        numerator -= 0.5;
    }
    let z = numerator / sigma_sq.sqrt();

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| SelectorError::primitive(TEST_NAME, e.to_string()))?;
    Ok((2.0 * normal.sf(z)).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_complete_separation() {
        // Only one of C(10, 5) = 252 arrangements reaches U = 25
        let result =
            mann_whitney_u(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0], RankOptions::default())
                .unwrap();
        assert_eq!(result.method, RankMethod::Exact);
        assert_eq!(result.u, 0.0);
        assert!((result.pvalue - 2.0 / 252.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_distribution_sums_to_one() {
        assert!((exact_upper_tail(4, 6, 0) - 1.0).abs() < 1e-12);
        assert_eq!(exact_upper_tail(4, 6, 25), 0.0);
    }

    #[test]
    fn test_exact_small_table() {
        // n1 = n2 = 2: U ∈ {0,1,2,2,3,4} over 6 arrangements
        assert!((exact_upper_tail(2, 2, 4) - 1.0 / 6.0).abs() < 1e-12);
        assert!((exact_upper_tail(2, 2, 3) - 2.0 / 6.0).abs() < 1e-12);
        assert!((exact_upper_tail(2, 2, 2) - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_asymptotic_with_ties() {
        // Nine tied ones: R1 = 9 * 5 + 20 = 65, U1 = 10
        let control = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0];
        let test = [2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0];
        let result = mann_whitney_u(&control, &test, RankOptions::default()).unwrap();

        assert_eq!(result.method, RankMethod::Asymptotic);
        assert_eq!(result.u, 10.0);
        // z = 39.5 / sqrt(100/12 * (21 - 720/380))
        assert!((result.pvalue - 0.001_75).abs() < 1e-4, "p = {}", result.pvalue);
    }

    #[test]
    fn test_continuity_correction_raises_pvalue() {
        let a: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..20).map(|i| i as f64 + 6.5).collect();
        let with = mann_whitney_u(&a, &b, RankOptions::default()).unwrap();
        let without = mann_whitney_u(
            &a,
            &b,
            RankOptions {
                continuity_correction: false,
                ..RankOptions::default()
            },
        )
        .unwrap();
        assert_eq!(with.method, RankMethod::Asymptotic);
        assert!(with.pvalue > without.pvalue);
    }

    #[test]
    fn test_swap_keeps_pvalue_and_complements_u() {
        let a = [1.2, 3.4, 2.2, 8.1, 5.5, 4.4, 0.3, 9.9, 7.0];
        let b = [2.5, 6.6, 7.7, 8.8, 9.1, 10.2, 11.0, 3.3, 4.9, 12.5];
        let ab = mann_whitney_u(&a, &b, RankOptions::default()).unwrap();
        let ba = mann_whitney_u(&b, &a, RankOptions::default()).unwrap();
        assert_eq!(ab.u + ba.u, (a.len() * b.len()) as f64);
        assert!((ab.pvalue - ba.pvalue).abs() < 1e-12);
    }

    #[test]
    fn test_all_values_tied() {
        let result = mann_whitney_u(&[3.0; 12], &[3.0; 12], RankOptions::default()).unwrap();
        assert_eq!(result.pvalue, 1.0);
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(mann_whitney_u(&[], &[1.0], RankOptions::default()).is_err());
        assert!(mann_whitney_u(&[1.0, f64::NAN], &[1.0], RankOptions::default()).is_err());
    }
}
