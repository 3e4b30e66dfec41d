//! CLI argument parsing for abselect

use crate::hypothesis::{SelectorConfig, VariancePolicy};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the test report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON object with `metric`, `summaries` and `result` keys
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "abselect")]
#[command(version)]
#[command(
    about = "Pick and run the right two-sample hypothesis test for an A/B experiment",
    long_about = None
)]
pub struct Cli {
    /// CSV file with the control group's observations
    #[arg(long, value_name = "FILE", requires = "test", conflicts_with = "data")]
    pub control: Option<PathBuf>,

    /// CSV file with the test group's observations
    #[arg(long, value_name = "FILE", requires = "control", conflicts_with = "data")]
    pub test: Option<PathBuf>,

    /// Single CSV file holding both groups, labelled by --group-column
    #[arg(long, value_name = "FILE", required_unless_present = "control")]
    pub data: Option<PathBuf>,

    /// Label column of --data (values: control, test)
    #[arg(long = "group-column", value_name = "NAME", default_value = "group")]
    pub group_column: String,

    /// Metric column to compare
    #[arg(short, long, value_name = "COLUMN", default_value = "Purchase")]
    pub metric: String,

    /// Significance level (overrides the config file)
    #[arg(short, long, value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// TOML file with selector settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Always pool variances in the t-test, whatever Levene says
    #[arg(long = "assume-equal-variance")]
    pub assume_equal_variance: bool,

    /// Print descriptive statistics of both groups before testing
    #[arg(long)]
    pub describe: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Selector settings: config file (or defaults), then command-line overrides
    pub fn selector_config(&self) -> Result<SelectorConfig> {
        let mut config = match &self.config {
            Some(path) => SelectorConfig::from_file(path)?,
            None => SelectorConfig::default(),
        };

        if let Some(alpha) = self.alpha {
            config.significance_level = alpha;
        }
        if self.assume_equal_variance {
            config.variance_policy = VariancePolicy::AssumeEqual;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parses_separate_files() {
        let cli = Cli::parse_from(["abselect", "--control", "c.csv", "--test", "t.csv"]);
        assert_eq!(cli.control, Some(PathBuf::from("c.csv")));
        assert_eq!(cli.test, Some(PathBuf::from("t.csv")));
        assert!(cli.data.is_none());
        assert_eq!(cli.metric, "Purchase");
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_parses_combined_file() {
        let cli = Cli::parse_from(["abselect", "--data", "ab.csv", "--group-column", "variant"]);
        assert_eq!(cli.data, Some(PathBuf::from("ab.csv")));
        assert_eq!(cli.group_column, "variant");
    }

    #[test]
    fn test_cli_group_column_default() {
        let cli = Cli::parse_from(["abselect", "--data", "ab.csv"]);
        assert_eq!(cli.group_column, "group");
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["abselect"]).is_err());
    }

    #[test]
    fn test_cli_control_requires_test() {
        assert!(Cli::try_parse_from(["abselect", "--control", "c.csv"]).is_err());
    }

    #[test]
    fn test_cli_data_conflicts_with_control() {
        assert!(Cli::try_parse_from([
            "abselect",
            "--data",
            "ab.csv",
            "--control",
            "c.csv",
            "--test",
            "t.csv"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_json_format() {
        let cli = Cli::parse_from(["abselect", "--data", "ab.csv", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_selector_config_defaults() {
        let cli = Cli::parse_from(["abselect", "--data", "ab.csv"]);
        assert_eq!(cli.selector_config().unwrap(), SelectorConfig::default());
    }

    #[test]
    fn test_selector_config_overrides() {
        let cli = Cli::parse_from([
            "abselect",
            "--data",
            "ab.csv",
            "--alpha",
            "0.01",
            "--assume-equal-variance",
        ]);
        let config = cli.selector_config().unwrap();
        assert_eq!(config.significance_level, 0.01);
        assert_eq!(config.variance_policy, VariancePolicy::AssumeEqual);
    }

    #[test]
    fn test_selector_config_invalid_alpha() {
        let cli = Cli::parse_from(["abselect", "--data", "ab.csv", "--alpha", "1.5"]);
        assert!(cli.selector_config().is_err());
    }

    #[test]
    fn test_alpha_flag_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "significance_level = 0.10\nexact_rank_max = 5").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["abselect", "--data", "ab.csv", "--config", &path]);
        let config = cli.selector_config().unwrap();
        assert_eq!(config.significance_level, 0.10);
        assert_eq!(config.exact_rank_max, 5);

        let cli = Cli::parse_from([
            "abselect", "--data", "ab.csv", "--config", &path, "--alpha", "0.02",
        ]);
        let config = cli.selector_config().unwrap();
        assert_eq!(config.significance_level, 0.02);
        assert_eq!(config.exact_rank_max, 5);
    }
}
