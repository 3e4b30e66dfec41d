//! Experiment data loading
//!
//! Two layouts are supported:
//! - one CSV per group (`control.csv`, `test.csv`) with identical columns
//! - a single CSV with a label column holding `control` / `test`
//!
//! Cells that are empty or spelled `NA`, `NaN` or `null` are missing and are
//! dropped when a metric is turned into a [`Sample`].

use crate::sample::{Group, Sample};
use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

/// Numeric columns of one experiment group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTable {
    group: Group,
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl GroupTable {
    /// Load a group's observations from a CSV file with a header row
    pub fn from_csv_path<P: AsRef<Path>>(group: Group, path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {} data: {}", group, path.display()))?;
        Self::from_reader(group, file)
            .with_context(|| format!("Failed to load {} data from {}", group, path.display()))
    }

    pub fn from_reader<R: Read>(group: Group, reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let columns = read_headers(&mut reader)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read CSV row")?;
            let line = record_line(&record);
            let row = columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| parse_cell(cell, column, line))
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        tracing::debug!("Loaded {} {} rows, {} columns", rows.len(), group, columns.len());
        Ok(Self {
            group,
            columns,
            rows,
        })
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Cells of one column, missing values included
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let index = column_index(&self.columns, name)?;
        Ok(self.rows.iter().map(|row| row[index]).collect())
    }
}

/// Control and test observations stacked with their group label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    columns: Vec<String>,
    rows: Vec<(Group, Vec<Option<f64>>)>,
}

impl LabeledDataset {
    /// Stack the two group tables; columns are matched by name
    pub fn concat(control: GroupTable, test: GroupTable) -> Result<Self> {
        if control.group != Group::Control || test.group != Group::Test {
            bail!(
                "Expected control and test tables, got {} and {}",
                control.group,
                test.group
            );
        }

        let mut sorted_control = control.columns.clone();
        let mut sorted_test = test.columns.clone();
        sorted_control.sort();
        sorted_test.sort();
        if sorted_control != sorted_test {
            bail!(
                "Control and test columns differ: {:?} vs {:?}",
                control.columns,
                test.columns
            );
        }

        // Reorder test cells into the control column order
        let order = control
            .columns
            .iter()
            .map(|name| column_index(&test.columns, name))
            .collect::<Result<Vec<_>>>()?;

        let columns = control.columns;
        let mut rows: Vec<(Group, Vec<Option<f64>>)> = control
            .rows
            .into_iter()
            .map(|row| (Group::Control, row))
            .collect();
        rows.extend(
            test.rows
                .into_iter()
                .map(|row| (Group::Test, order.iter().map(|&i| row[i]).collect())),
        );

        Ok(Self { columns, rows })
    }

    /// Load a combined CSV whose `group_column` labels each row
    pub fn from_csv_path<P: AsRef<Path>>(path: P, group_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open data file: {}", path.display()))?;
        Self::from_reader(file, group_column)
            .with_context(|| format!("Failed to load data from {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R, group_column: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = read_headers(&mut reader)?;
        let label_index = column_index(&headers, group_column)?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_index)
            .map(|(_, name)| name.clone())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read CSV row")?;
            let line = record_line(&record);

            let label = record.get(label_index).unwrap_or_default();
            let group: Group = label
                .parse()
                .map_err(|e: String| anyhow::anyhow!("line {}: {}", line, e))?;

            let row = headers
                .iter()
                .zip(record.iter())
                .enumerate()
                .filter(|(i, _)| *i != label_index)
                .map(|(_, (column, cell))| parse_cell(cell, column, line))
                .collect::<Result<Vec<_>>>()?;
            rows.push((group, row));
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one group as a standalone table
    pub fn group_table(&self, group: Group) -> GroupTable {
        GroupTable {
            group,
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(g, _)| *g == group)
                .map(|(_, row)| row.clone())
                .collect(),
        }
    }

    /// Non-missing values of `metric` for one group
    pub fn sample(&self, group: Group, metric: &str) -> Result<Sample> {
        let index = column_index(&self.columns, metric)?;
        let cells = self
            .rows
            .iter()
            .filter(|(g, _)| *g == group)
            .map(|(_, row)| row[index]);
        let sample = Sample::from_optional(group, cells);

        let dropped = self.rows.iter().filter(|(g, _)| *g == group).count() - sample.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} missing {} values of {}", dropped, group, metric);
        }
        Ok(sample)
    }

    /// Mean of `metric` per group, `None` for a group without values
    pub fn group_means(&self, metric: &str) -> Result<Vec<(Group, Option<f64>)>> {
        [Group::Control, Group::Test]
            .into_iter()
            .map(|group| Ok((group, self.sample(group, metric)?.mean())))
            .collect()
    }
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>> {
    let headers = reader.headers().context("Failed to read CSV header")?;
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if columns.iter().all(|c| c.is_empty()) {
        bail!("CSV header is empty");
    }
    Ok(columns)
}

fn record_line(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn column_index(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .with_context(|| format!("Column '{}' not found (available: {:?})", name, columns))
}

fn parse_cell(cell: &str, column: &str, line: u64) -> Result<Option<f64>> {
    let cell = cell.trim();
    if is_missing(cell) {
        return Ok(None);
    }
    // Spellings like "-nan" slip past the token list but still parse to NaN
    cell.parse::<f64>()
        .map(|value| (!value.is_nan()).then_some(value))
        .with_context(|| format!("line {}: column '{}' has non-numeric value '{}'", line, column, cell))
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty()
        || ["na", "nan", "null"]
            .iter()
            .any(|token| cell.eq_ignore_ascii_case(token))
}
