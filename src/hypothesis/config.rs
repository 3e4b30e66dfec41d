// Configuration for hypothesis-test selection
//
// One significance level drives every decision in the cascade: the two
// normality checks, the variance check and the final mean comparison.

use crate::error::{Result, SelectorError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upper bound for `exact_rank_max`; the exact Mann-Whitney table grows
/// with n1 * n2 * min(n1, n2)
pub const EXACT_RANK_LIMIT: usize = 50;

/// How the variance-homogeneity result feeds the t-test choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariancePolicy {
    /// Pooled t-test when Levene accepts equal variances, Welch otherwise
    Levene,
    /// Always pool. Levene still runs and is reported, but does not steer.
    AssumeEqual,
}

/// Center used for Levene's absolute deviations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeveneCenter {
    /// Brown-Forsythe variant, robust to skew
    Median,
    /// Levene's original formulation
    Mean,
}

/// Configuration for the test selector
///
/// # Example
/// ```
/// use abselect::hypothesis::SelectorConfig;
///
/// let config = SelectorConfig::default();
/// assert_eq!(config.significance_level, 0.05);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Significance level (alpha) shared by every test in the cascade
    ///
    /// A null hypothesis is rejected when p < alpha.
    pub significance_level: f64,

    /// Minimum observations per group
    ///
    /// Shapiro-Wilk is undefined below 3, so lower values are rejected.
    pub min_sample_size: usize,

    /// Whether the Levene outcome selects Student or Welch
    pub variance_policy: VariancePolicy,

    /// Center for Levene's deviations
    pub levene_center: LeveneCenter,

    /// Apply the 0.5 continuity correction to the Mann-Whitney normal approximation
    pub continuity_correction: bool,

    /// Largest smaller-group size for which the exact Mann-Whitney
    /// distribution is used (tie-free samples only)
    pub exact_rank_max: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            min_sample_size: 3,
            variance_policy: VariancePolicy::Levene,
            levene_center: LeveneCenter::Median,
            continuity_correction: true,
            exact_rank_max: 8,
        }
    }
}

impl SelectorConfig {
    /// Default configuration at a different significance level
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            significance_level: alpha,
            ..Self::default()
        }
    }

    /// 99% confidence
    pub fn strict() -> Self {
        Self::with_alpha(0.01)
    }

    /// 90% confidence
    pub fn permissive() -> Self {
        Self::with_alpha(0.10)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(SelectorError::InvalidConfig(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }

        if self.min_sample_size < 3 {
            return Err(SelectorError::InvalidConfig(format!(
                "min_sample_size must be >= 3 for Shapiro-Wilk, got {}",
                self.min_sample_size
            )));
        }

        if self.exact_rank_max > EXACT_RANK_LIMIT {
            return Err(SelectorError::InvalidConfig(format!(
                "exact_rank_max must be <= {}, got {}",
                EXACT_RANK_LIMIT, self.exact_rank_max
            )));
        }

        Ok(())
    }

    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to the defaults.
    ///
    /// ```no_run
    /// use abselect::hypothesis::SelectorConfig;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = SelectorConfig::from_file("abselect.toml")?;
    /// println!("alpha = {}", config.significance_level);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let config: SelectorConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }
}
