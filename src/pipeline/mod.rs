//! Feature pipeline: deterministic raw record → numeric vector transform.
//!
//! The pipeline owns imputation, derived features, categorical encoding,
//! feature alignment, and scaling. Fitting produces a [`PipelineState`] —
//! an explicit, immutable artifact capturing every statistic needed to
//! reproduce the transformation outside the fit run. [`FeaturePipeline::apply`]
//! takes the state by reference and performs byte-for-byte the same
//! sequence, so training-time and serving-time features cannot skew.
//!
//! The state is a plain value, never process-global: several prediction
//! services holding different states can coexist in one process.
//!
//! Transform order, identical in fit and apply:
//!
//! 1. impute (fit-time medians / modes, stored)
//! 2. derive (`TotalSF`, `TotalBath`, `HouseAge`, `IsRemodeled`)
//! 3. encode (stored category→code maps, unseen → −1)
//! 4. align to the stored `feature_names` (absent → 0, extras dropped)
//! 5. scale (stored mean / population std)

pub mod derive;
pub mod encode;
pub mod impute;
pub mod scale;

pub use encode::{CategoryMap, UNSEEN_CODE};
pub use scale::ScalerStats;

use crate::data::{RawTable, RawValue, Record};
use crate::error::PipelineError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed-order numeric representation of a batch of records.
pub type FeatureMatrix = Array2<f64>;

/// Fixed-order numeric representation of a single record.
pub type FeatureVector = Array1<f64>;

/// Fitted, persistable pipeline artifact.
///
/// Created once during fit and read-only thereafter. Contains everything
/// [`FeaturePipeline::apply`] needs: imputation fill values, category
/// maps, scaling statistics, and the feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Median fill per numeric column, keyed by column name.
    pub numeric_fill: BTreeMap<String, f64>,
    /// Mode fill per categorical column (or the `"None"` sentinel).
    pub categorical_fill: BTreeMap<String, String>,
    /// Category → code map per categorical column.
    pub encoders: BTreeMap<String, CategoryMap>,
    /// Per-feature standardization statistics, aligned to `feature_names`.
    pub scaler: ScalerStats,
    /// The fitted feature order. Every produced vector matches this
    /// exactly, in length and ordering.
    pub feature_names: Vec<String>,
}

impl PipelineState {
    /// Number of features every produced vector will have.
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Output of a pipeline fit.
#[derive(Debug)]
pub struct FitOutput {
    /// The fitted transformation state.
    pub state: PipelineState,
    /// The transformed training table, row order preserved.
    pub matrix: FeatureMatrix,
    /// The target column split off before transformation.
    pub target: Vec<f64>,
}

/// The raw → numeric transformation, parameterized by the target and
/// identifier column names.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    target_column: String,
    id_column: String,
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self {
            target_column: "SalePrice".to_string(),
            id_column: "Id".to_string(),
        }
    }
}

/// Render a raw value as a category string. Numbers that land in a
/// categorical column are formatted without a trailing `.0` so fit and
/// apply agree on the key.
fn category_string(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Cat(s) => Some(s.clone()),
        RawValue::Num(v) => {
            if v.fract() == 0.0 && v.is_finite() {
                Some(format!("{}", *v as i64))
            } else {
                Some(v.to_string())
            }
        }
        RawValue::Missing => None,
    }
}

impl FeaturePipeline {
    /// Pipeline for the standard schema (`SalePrice` target, `Id` key).
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the target column name.
    pub fn with_target_column(mut self, name: &str) -> Self {
        self.target_column = name.to_string();
        self
    }

    /// Override the identifier column name.
    pub fn with_id_column(mut self, name: &str) -> Self {
        self.id_column = name.to_string();
        self
    }

    /// Fit the pipeline on a raw training table (which must include the
    /// target column) and transform it in the same pass.
    pub fn fit(&self, table: &RawTable) -> Result<FitOutput, PipelineError> {
        if table.n_rows() == 0 {
            return Err(PipelineError::EmptyTable(
                "cannot fit on a table with no rows".to_string(),
            ));
        }

        let mut working = table.clone();
        let target = working.numeric_column_strict(&self.target_column)?;
        working.take_column(&self.target_column);
        working.take_column(&self.id_column);

        if working.n_cols() == 0 {
            return Err(PipelineError::NoFeatures);
        }

        // Classify columns by observed content: any categorical value
        // makes the column categorical.
        let mut numeric_cols: Vec<String> = Vec::new();
        let mut categorical_cols: Vec<String> = Vec::new();
        for name in working.columns().to_vec() {
            let col = working.column(&name).unwrap_or(&[]);
            let is_categorical = col.iter().any(|v| matches!(v, RawValue::Cat(_)));
            if is_categorical {
                categorical_cols.push(name);
            } else {
                numeric_cols.push(name);
            }
        }

        // Imputation statistics, each column from its own values only.
        let mut numeric_fill: BTreeMap<String, f64> = BTreeMap::new();
        for name in &numeric_cols {
            let observed: Vec<f64> = working
                .column(name)
                .unwrap_or(&[])
                .iter()
                .filter_map(|v| match v {
                    RawValue::Num(x) => Some(*x),
                    _ => None,
                })
                .collect();
            let fill = impute::median(&observed).unwrap_or(impute::EMPTY_NUMERIC_FILL);
            numeric_fill.insert(name.clone(), fill);
        }

        let mut categorical_fill: BTreeMap<String, String> = BTreeMap::new();
        for name in &categorical_cols {
            let observed: Vec<String> = working
                .column(name)
                .unwrap_or(&[])
                .iter()
                .filter_map(category_string)
                .collect();
            let fill = impute::mode_first_seen(observed.iter().map(|s| s.as_str()))
                .unwrap_or_else(|| impute::EMPTY_CATEGORY_FILL.to_string());
            categorical_fill.insert(name.clone(), fill);
        }

        impute_table(&mut working, &numeric_fill, &categorical_fill);
        derive::add_derived_features(&mut working)?;

        // Encode categoricals in first-seen row order.
        let mut encoders: BTreeMap<String, CategoryMap> = BTreeMap::new();
        for name in &categorical_cols {
            let values: Vec<String> = working
                .column(name)
                .unwrap_or(&[])
                .iter()
                .filter_map(category_string)
                .collect();
            let map = CategoryMap::fit(values.iter().map(|s| s.as_str()));

            let codes: Vec<f64> = values.iter().map(|v| map.code(v) as f64).collect();
            working.set_numeric_column(name, codes);
            encoders.insert(name.clone(), map);
        }

        // The fitted feature order is the working table's column order;
        // alignment against it is a no-op here by construction.
        let feature_names: Vec<String> = working.columns().to_vec();
        let mut matrix = assemble_matrix(&working, &feature_names, &numeric_fill);

        let scaler = ScalerStats::fit(&matrix);
        scaler.transform(&mut matrix);

        let state = PipelineState {
            numeric_fill,
            categorical_fill,
            encoders,
            scaler,
            feature_names,
        };
        Ok(FitOutput {
            state,
            matrix,
            target,
        })
    }

    /// Transform a batch of raw records using a previously fitted state.
    ///
    /// Performs the identical impute → derive → encode → align → scale
    /// sequence using only stored statistics. Fields absent from training
    /// are dropped; fitted features absent from the records become 0
    /// after alignment; unseen category values encode to −1.
    pub fn apply(
        &self,
        records: &[Record],
        state: &PipelineState,
    ) -> Result<FeatureMatrix, PipelineError> {
        let mut working = RawTable::from_records(records);
        working.take_column(&self.target_column);
        working.take_column(&self.id_column);

        impute_table(&mut working, &state.numeric_fill, &state.categorical_fill);
        derive::add_derived_features(&mut working)?;

        for (name, map) in &state.encoders {
            if let Some(col) = working.column(name) {
                let codes: Vec<f64> = col
                    .iter()
                    .map(|v| match category_string(v) {
                        Some(s) => map.code(&s) as f64,
                        None => UNSEEN_CODE as f64,
                    })
                    .collect();
                working.set_numeric_column(name, codes);
            }
        }

        let mut matrix = assemble_matrix(&working, &state.feature_names, &state.numeric_fill);
        state.scaler.transform(&mut matrix);
        Ok(matrix)
    }

    /// Transform a single record into one feature vector.
    pub fn apply_record(
        &self,
        record: &Record,
        state: &PipelineState,
    ) -> Result<FeatureVector, PipelineError> {
        let matrix = self.apply(std::slice::from_ref(record), state)?;
        Ok(matrix.row(0).to_owned())
    }
}

/// Replace missing entries using the stored fill values. Only columns the
/// fills know about are touched; alignment handles everything else.
fn impute_table(
    table: &mut RawTable,
    numeric_fill: &BTreeMap<String, f64>,
    categorical_fill: &BTreeMap<String, String>,
) {
    for name in table.columns().to_vec() {
        if let Some(fill) = numeric_fill.get(&name) {
            let col = table.column(&name).unwrap_or(&[]).to_vec();
            let filled: Vec<RawValue> = col
                .into_iter()
                .map(|v| match v {
                    RawValue::Missing => RawValue::Num(*fill),
                    other => other,
                })
                .collect();
            table.set_column(&name, filled);
        } else if let Some(fill) = categorical_fill.get(&name) {
            let col = table.column(&name).unwrap_or(&[]).to_vec();
            let filled: Vec<RawValue> = col
                .into_iter()
                .map(|v| match v {
                    RawValue::Missing => RawValue::Cat(fill.clone()),
                    other => other,
                })
                .collect();
            table.set_column(&name, filled);
        }
    }
}

/// Reduce and reorder the working table to exactly `feature_names`,
/// inserting 0 for fitted features the table lacks.
fn assemble_matrix(
    table: &RawTable,
    feature_names: &[String],
    numeric_fill: &BTreeMap<String, f64>,
) -> FeatureMatrix {
    let rows = table.n_rows();
    let cols = feature_names.len();
    let mut matrix = Array2::zeros((rows, cols));

    for (j, name) in feature_names.iter().enumerate() {
        let Some(col) = table.column(name) else {
            continue; // stays 0
        };
        for (i, value) in col.iter().enumerate() {
            matrix[[i, j]] = match value {
                RawValue::Num(v) => *v,
                // A stray string in a numeric slot: recover a number if
                // it parses, otherwise fall back to the stored fill.
                RawValue::Cat(s) => s
                    .trim()
                    .parse::<f64>()
                    .unwrap_or_else(|_| numeric_fill.get(name).copied().unwrap_or(0.0)),
                RawValue::Missing => numeric_fill.get(name).copied().unwrap_or(0.0),
            };
        }
    }
    matrix
}
