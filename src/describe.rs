//! Descriptive summaries of experiment columns
//!
//! Quick look at the data before testing: row and column counts plus, per
//! column, the non-missing count, mean, standard deviation and a quantile
//! ladder. Statistics run on `trueno::Vector` and quantiles come from
//! `aprender::stats::DescriptiveStats` (R-7 interpolation).

use crate::dataset::GroupTable;
use crate::sample::Group;
use anyhow::Result;
use aprender::stats::DescriptiveStats;
use serde::Serialize;
use trueno::Vector;

/// Quantile levels reported for every column
pub const QUANTILES: [f64; 6] = [0.0, 0.05, 0.5, 0.95, 0.99, 1.0];

/// Summary of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Non-missing cells
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub std: Option<f64>,
    /// (level, value) pairs at [`QUANTILES`]
    pub quantiles: Vec<(f64, f64)>,
}

/// Summary of a whole group table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub group: Group,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl TableSummary {
    /// Plain-text table for terminal output
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "📋 {} data: {} rows, {} columns\n",
            self.group,
            self.rows,
            self.columns.len()
        ));

        report.push_str(&format!(
            "  {:<16} {:>7} {:>7} {:>12} {:>12}",
            "column", "count", "missing", "mean", "std"
        ));
        for level in QUANTILES {
            report.push_str(&format!(" {:>10}", format!("q{}", level)));
        }
        report.push('\n');

        for column in &self.columns {
            report.push_str(&format!(
                "  {:<16} {:>7} {:>7} {:>12} {:>12}",
                column.name,
                column.count,
                column.missing,
                fmt_opt(column.mean),
                fmt_opt(column.std)
            ));
            for (_, value) in &column.quantiles {
                report.push_str(&format!(" {:>10.2}", value));
            }
            report.push('\n');
        }
        report
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Summarize every column of a group table
pub fn describe(table: &GroupTable) -> Result<TableSummary> {
    let columns = table
        .columns()
        .iter()
        .map(|name| {
            let cells = table.column(name)?;
            summarize_column(name, &cells)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TableSummary {
        group: table.group(),
        rows: table.n_rows(),
        columns,
    })
}

fn summarize_column(name: &str, cells: &[Option<f64>]) -> Result<ColumnSummary> {
    let values: Vec<f32> = cells.iter().flatten().map(|&v| v as f32).collect();
    let count = values.len();
    let missing = cells.len() - count;

    if count == 0 {
        return Ok(ColumnSummary {
            name: name.to_string(),
            count,
            missing,
            mean: None,
            std: None,
            quantiles: Vec::new(),
        });
    }

    let v = Vector::from_slice(&values);
    let mean = v.mean().ok().map(f64::from);
    // trueno reports the population variance
    let std = if count > 1 {
        v.variance()
            .ok()
            .map(|var| (f64::from(var) * count as f64 / (count as f64 - 1.0)).sqrt())
    } else {
        None
    };

    let stats = DescriptiveStats::new(&v);
    let quantiles = QUANTILES
        .iter()
        .map(|&q| {
            stats
                .quantile(q)
                .map(|value| (q, f64::from(value)))
                .map_err(|e| anyhow::anyhow!("Failed to compute q{} of '{}': {}", q, name, e))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ColumnSummary {
        name: name.to_string(),
        count,
        missing,
        mean,
        std,
        quantiles,
    })
}
