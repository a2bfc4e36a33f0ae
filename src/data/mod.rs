//! Raw tabular data: records, tables, and CSV ingestion.
//!
//! The unit of input is a [`Record`] — one property's raw field values,
//! keyed by field name. A [`RawTable`] is a column-oriented batch of
//! records that preserves column insertion order and row order; both
//! orders matter because the fitted category encodings are assigned in
//! first-seen order.
//!
//! # Missing values
//!
//! Missingness is explicit: a cell is [`RawValue::Missing`] rather than a
//! NaN convention. When reading CSV, empty cells and the literal `NA`
//! (the Ames housing dataset's marker) parse as missing.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A single raw cell value: numeric, categorical, or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    /// A numeric measurement (area, count, year, ...).
    Num(f64),
    /// A categorical code (zoning class, neighborhood, ...).
    Cat(String),
    /// An absent value. Distinct from an absent *field*.
    Missing,
}

impl RawValue {
    /// Parse a CSV cell. Empty and `NA` are missing; anything that parses
    /// as a float is numeric; the rest is categorical.
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() || trimmed == "NA" {
            return RawValue::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => RawValue::Num(v),
            Err(_) => RawValue::Cat(trimmed.to_string()),
        }
    }

    /// True if this cell carries no value.
    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Num(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Cat(v.to_string())
    }
}

/// One property's raw field values. Immutable once handed to the
/// pipeline; the builder-style [`Record::set`] exists for construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, RawValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, consuming and returning the record for chaining.
    pub fn set(mut self, name: &str, value: impl Into<RawValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Look up a field by name. `None` means the field is absent, which
    /// is different from a present-but-missing value.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no fields are present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Column-oriented table of raw records.
///
/// Column order is insertion order and row order is input order; neither
/// is ever re-sorted, so category codes assigned in first-seen order are
/// reproducible run to run.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    columns: Vec<String>,
    data: HashMap<String, Vec<RawValue>>,
    n_rows: usize,
}

impl RawTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a table from a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut table = RawTable::new();
        for header in &headers {
            table.columns.push(header.clone());
            table.data.insert(header.clone(), Vec::new());
        }

        for result in reader.records() {
            let row = result?;
            for (header, cell) in headers.iter().zip(row.iter()) {
                if let Some(col) = table.data.get_mut(header) {
                    col.push(RawValue::parse(cell));
                }
            }
            table.n_rows += 1;
        }
        Ok(table)
    }

    /// Assemble a table from records. Column order is first-seen order
    /// across records in row order; fields absent from a record become
    /// absent columns only if no record carries them, otherwise the gap
    /// rows hold [`RawValue::Missing`].
    pub fn from_records(records: &[Record]) -> Self {
        let mut table = RawTable::new();
        for record in records {
            for name in record.field_names() {
                if !table.data.contains_key(name) {
                    table.columns.push(name.to_string());
                    // Backfill rows already consumed.
                    table
                        .data
                        .insert(name.to_string(), vec![RawValue::Missing; table.n_rows]);
                }
            }
            for name in table.columns.clone() {
                let value = record
                    .get(&name)
                    .cloned()
                    .unwrap_or(RawValue::Missing);
                if let Some(col) = table.data.get_mut(&name) {
                    col.push(value);
                }
            }
            table.n_rows += 1;
        }
        table
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// True if the named column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Values of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<&[RawValue]> {
        self.data.get(name).map(|v| v.as_slice())
    }

    /// Append a column. Replaces values if the column already exists,
    /// keeping its original position in the column order.
    pub fn set_column(&mut self, name: &str, values: Vec<RawValue>) {
        debug_assert!(self.n_rows == 0 || values.len() == self.n_rows);
        if self.n_rows == 0 {
            self.n_rows = values.len();
        }
        if !self.data.contains_key(name) {
            self.columns.push(name.to_string());
        }
        self.data.insert(name.to_string(), values);
    }

    /// Append a numeric column from plain floats.
    pub fn set_numeric_column(&mut self, name: &str, values: Vec<f64>) {
        self.set_column(name, values.into_iter().map(RawValue::Num).collect());
    }

    /// Remove and return a column, preserving the order of the rest.
    pub fn take_column(&mut self, name: &str) -> Option<Vec<RawValue>> {
        let values = self.data.remove(name)?;
        self.columns.retain(|c| c != name);
        Some(values)
    }

    /// Extract one row as a [`Record`]. Missing cells stay present as
    /// [`RawValue::Missing`]: a record drawn from a fit table must carry
    /// the same missingness the fit saw, or imputation parity breaks.
    pub fn record(&self, row: usize) -> Record {
        let mut record = Record::new();
        for name in &self.columns {
            if let Some(col) = self.data.get(name) {
                record.fields.insert(name.clone(), col[row].clone());
            }
        }
        record
    }

    /// Interpret a column as numeric, requiring every value present.
    /// Used for the target column, which may not contain gaps.
    pub fn numeric_column_strict(&self, name: &str) -> Result<Vec<f64>, PipelineError> {
        let col = self
            .column(name)
            .ok_or_else(|| PipelineError::MissingTarget(name.to_string()))?;
        let mut out = Vec::with_capacity(col.len());
        for value in col {
            match value {
                RawValue::Num(v) => out.push(*v),
                _ => {
                    return Err(PipelineError::EmptyTable(format!(
                        "column `{name}` has non-numeric or missing entries"
                    )))
                }
            }
        }
        Ok(out)
    }
}
