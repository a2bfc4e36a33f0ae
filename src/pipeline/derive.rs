//! Derived features.
//!
//! Computed after imputation and before encoding, with the exact formulas
//! the model was designed around:
//!
//! - `TotalSF = TotalBsmtSF + FirstFlrSF + SecondFlrSF`
//! - `TotalBath = FullBath + 0.5*HalfBath + BsmtFullBath + 0.5*BsmtHalfBath`
//! - `HouseAge = YrSold - YearBuilt`
//! - `IsRemodeled = 1 if YearRemodAdd != YearBuilt else 0`
//!
//! A table lacking one of the base columns is a malformed payload, not
//! ordinary missingness, and fails with a schema error naming the field.

use crate::data::{RawTable, RawValue};
use crate::error::PipelineError;

/// Names of the derived feature columns, in the order they are appended.
pub const DERIVED_FEATURES: [&str; 4] = ["TotalSF", "TotalBath", "HouseAge", "IsRemodeled"];

/// Base columns every derived-feature formula needs.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "TotalBsmtSF",
    "FirstFlrSF",
    "SecondFlrSF",
    "FullBath",
    "HalfBath",
    "BsmtFullBath",
    "BsmtHalfBath",
    "YrSold",
    "YearBuilt",
    "YearRemodAdd",
];

/// Extract a column as floats, failing with a schema error if the column
/// carries non-numeric values. Column presence is checked up front
/// against [`REQUIRED_FIELDS`].
fn numeric_column(table: &RawTable, name: &str) -> Result<Vec<f64>, PipelineError> {
    let col = table.column(name).ok_or_else(|| PipelineError::Schema {
        field: name.to_string(),
    })?;
    let mut out = Vec::with_capacity(col.len());
    for value in col {
        match value {
            RawValue::Num(v) => out.push(*v),
            _ => {
                return Err(PipelineError::Schema {
                    field: name.to_string(),
                })
            }
        }
    }
    Ok(out)
}

/// Append the four derived feature columns to `table`.
pub fn add_derived_features(table: &mut RawTable) -> Result<(), PipelineError> {
    for field in REQUIRED_FIELDS {
        if !table.has_column(field) {
            return Err(PipelineError::Schema {
                field: field.to_string(),
            });
        }
    }

    let total_bsmt = numeric_column(table, "TotalBsmtSF")?;
    let first_flr = numeric_column(table, "FirstFlrSF")?;
    let second_flr = numeric_column(table, "SecondFlrSF")?;

    let full_bath = numeric_column(table, "FullBath")?;
    let half_bath = numeric_column(table, "HalfBath")?;
    let bsmt_full = numeric_column(table, "BsmtFullBath")?;
    let bsmt_half = numeric_column(table, "BsmtHalfBath")?;

    let yr_sold = numeric_column(table, "YrSold")?;
    let year_built = numeric_column(table, "YearBuilt")?;
    let year_remod = numeric_column(table, "YearRemodAdd")?;

    let n = table.n_rows();

    let total_sf: Vec<f64> = (0..n)
        .map(|i| total_bsmt[i] + first_flr[i] + second_flr[i])
        .collect();
    let total_bath: Vec<f64> = (0..n)
        .map(|i| full_bath[i] + 0.5 * half_bath[i] + bsmt_full[i] + 0.5 * bsmt_half[i])
        .collect();
    let house_age: Vec<f64> = (0..n).map(|i| yr_sold[i] - year_built[i]).collect();
    let is_remodeled: Vec<f64> = (0..n)
        .map(|i| if year_remod[i] != year_built[i] { 1.0 } else { 0.0 })
        .collect();

    let columns = [total_sf, total_bath, house_age, is_remodeled];
    for (name, values) in DERIVED_FEATURES.iter().zip(columns) {
        table.set_numeric_column(name, values);
    }
    Ok(())
}
