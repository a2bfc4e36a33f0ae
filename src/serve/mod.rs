//! Prediction serving.
//!
//! [`PredictionService`] bundles a fitted pipeline state with the
//! selected model. Construction is eager: [`PredictionService::open`]
//! loads every artifact up front, so a missing or corrupt model surfaces
//! as [`ServeError::ModelNotLoaded`] before the first request, never
//! during one.
//!
//! Confidence bounds are an ensemble property. When the loaded model
//! exposes per-sub-estimator predictions the service reports a 95%
//! interval from their spread; otherwise the bounds are `None` rather
//! than a fabricated interval.

use crate::artifacts::ArtifactStore;
use crate::data::Record;
use crate::error::ServeError;
use crate::model::Regressor;
use crate::pipeline::{FeaturePipeline, PipelineState};
use std::path::Path;
use tracing::{debug, info};

/// Two-sided 95% normal quantile.
const CONFIDENCE_Z: f64 = 1.96;

/// A prediction with optional confidence bounds.
///
/// `lower_bound` is floored at zero: a negative sale price is not a
/// meaningful lower estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub prediction: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

/// A loaded model plus the pipeline state it was trained with.
#[derive(Debug, Clone)]
pub struct PredictionService {
    pipeline: FeaturePipeline,
    state: PipelineState,
    model: Regressor,
}

impl PredictionService {
    /// Load the service from a training artifact directory. Fails
    /// eagerly when any required artifact is absent or unreadable.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ServeError> {
        let store = ArtifactStore::new(dir.as_ref());
        let state = store
            .load_state()
            .map_err(|e| ServeError::ModelNotLoaded {
                reason: e.to_string(),
            })?;
        let model = store
            .load_best_model()
            .map_err(|e| ServeError::ModelNotLoaded {
                reason: e.to_string(),
            })?;
        info!(
            dir = %dir.as_ref().display(),
            model = model.family(),
            features = state.n_features(),
            "prediction service ready"
        );
        Ok(Self::from_parts(state, model))
    }

    /// Assemble a service from an in-memory state and model.
    pub fn from_parts(state: PipelineState, model: Regressor) -> Self {
        Self {
            pipeline: FeaturePipeline::new(),
            state,
            model,
        }
    }

    /// The loaded model's family name.
    pub fn model_family(&self) -> &'static str {
        self.model.family()
    }

    /// Point prediction for one raw record.
    pub fn predict(&self, record: &Record) -> Result<f64, ServeError> {
        let features = self.pipeline.apply_record(record, &self.state)?;
        Ok(self.model.predict_row(features.view()))
    }

    /// Prediction with a 95% confidence interval when the model supports
    /// one. The interval is the ensemble spread of the sub-estimators;
    /// point models return `None` bounds.
    pub fn predict_with_confidence(&self, record: &Record) -> Result<PredictionResult, ServeError> {
        let features = self.pipeline.apply_record(record, &self.state)?;
        let prediction = self.model.predict_row(features.view());

        let Some(subs) = self.model.sub_predictions(features.view()) else {
            debug!(model = self.model.family(), "no ensemble spread available");
            return Ok(PredictionResult {
                prediction,
                lower_bound: None,
                upper_bound: None,
            });
        };

        let n = subs.len() as f64;
        let mean = subs.iter().sum::<f64>() / n;
        let var = subs.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let spread = CONFIDENCE_Z * var.sqrt();

        Ok(PredictionResult {
            prediction,
            lower_bound: Some((prediction - spread).max(0.0)),
            upper_bound: Some(prediction + spread),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawTable;
    use crate::model::{RandomForestRegressor, RidgeRegression};
    use ndarray::Array2;

    /// Fit a pipeline and both model families on a small consistent
    /// table, returning the state and the training matrix.
    fn fitted() -> (PipelineState, Array2<f64>, Vec<f64>, RawTable) {
        let mut table = RawTable::new();
        table.set_numeric_column("Id", (1..=8).map(|i| i as f64).collect());
        table.set_numeric_column(
            "TotalBsmtSF",
            vec![800.0, 900.0, 850.0, 700.0, 950.0, 880.0, 820.0, 760.0],
        );
        table.set_numeric_column(
            "FirstFlrSF",
            vec![850.0, 1100.0, 900.0, 950.0, 1200.0, 1000.0, 870.0, 920.0],
        );
        table.set_numeric_column(
            "SecondFlrSF",
            vec![850.0, 0.0, 860.0, 750.0, 0.0, 500.0, 840.0, 0.0],
        );
        table.set_numeric_column("FullBath", vec![2.0, 2.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0]);
        table.set_numeric_column("HalfBath", vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        table.set_numeric_column("BsmtFullBath", vec![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        table.set_numeric_column("BsmtHalfBath", vec![0.0; 8]);
        table.set_numeric_column(
            "YrSold",
            vec![2008.0, 2007.0, 2008.0, 2006.0, 2009.0, 2008.0, 2007.0, 2006.0],
        );
        table.set_numeric_column(
            "YearBuilt",
            vec![2003.0, 1976.0, 2001.0, 1915.0, 2000.0, 1993.0, 2004.0, 1973.0],
        );
        table.set_numeric_column(
            "YearRemodAdd",
            vec![2003.0, 1976.0, 2002.0, 1970.0, 2000.0, 1995.0, 2004.0, 1973.0],
        );
        table.set_numeric_column(
            "SalePrice",
            vec![
                208500.0, 181500.0, 223500.0, 140000.0, 250000.0, 195000.0, 215000.0, 160000.0,
            ],
        );

        let fit = FeaturePipeline::new().fit(&table).unwrap();
        (fit.state, fit.matrix, fit.target, table)
    }

    #[test]
    fn point_model_predicts_without_bounds() {
        let (state, matrix, target, table) = fitted();
        let mut ridge = RidgeRegression::new(1.0);
        ridge.fit(&matrix, &target).unwrap();

        let service = PredictionService::from_parts(state, Regressor::Ridge(ridge));
        assert_eq!(service.model_family(), "Ridge Regression");

        let result = service.predict_with_confidence(&table.record(0)).unwrap();
        assert!(result.prediction.is_finite());
        assert_eq!(result.lower_bound, None);
        assert_eq!(result.upper_bound, None);

        let point = service.predict(&table.record(0)).unwrap();
        assert_eq!(point, result.prediction);
    }

    #[test]
    fn ensemble_model_brackets_its_prediction() {
        let (state, matrix, target, table) = fitted();
        let mut forest = RandomForestRegressor::new(20).with_random_state(42);
        forest.fit(&matrix, &target).unwrap();

        let service = PredictionService::from_parts(state, Regressor::Forest(forest));
        let result = service.predict_with_confidence(&table.record(2)).unwrap();

        let lower = result.lower_bound.unwrap();
        let upper = result.upper_bound.unwrap();
        assert!(lower <= result.prediction);
        assert!(result.prediction <= upper);
        assert!(lower >= 0.0);
    }

    #[test]
    fn lower_bound_never_goes_negative() {
        let (state, _, _, table) = fitted();
        // Trees that disagree wildly around a near-zero mean force the
        // raw lower bound below zero.
        let mut forest = RandomForestRegressor::new(10).with_random_state(1);
        let tiny_x = Array2::from_shape_fn((6, state.n_features()), |(i, _)| i as f64);
        let tiny_y = vec![0.0, 5000.0, 0.0, 4000.0, 100.0, 3000.0];
        forest.fit(&tiny_x, &tiny_y).unwrap();

        let service = PredictionService::from_parts(state, Regressor::Forest(forest));
        let result = service.predict_with_confidence(&table.record(0)).unwrap();
        assert!(result.lower_bound.unwrap() >= 0.0);
    }

    #[test]
    fn open_on_missing_directory_reports_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let err = PredictionService::open(dir.path().join("never_trained")).unwrap_err();
        assert!(matches!(err, ServeError::ModelNotLoaded { .. }));
    }

    #[test]
    fn schema_violation_surfaces_as_pipeline_error() {
        let (state, matrix, target, _) = fitted();
        let mut ridge = RidgeRegression::new(1.0);
        ridge.fit(&matrix, &target).unwrap();
        let service = PredictionService::from_parts(state, Regressor::Ridge(ridge));

        let bare = Record::new().set("FullBath", 2.0);
        let err = service.predict(&bare).unwrap_err();
        assert!(matches!(err, ServeError::Pipeline(_)));
    }
}
