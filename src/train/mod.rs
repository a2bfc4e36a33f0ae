//! Model training: candidate families, hyperparameter grids, and
//! best-model selection.
//!
//! A training run holds out a validation subset (seeded shuffle, so the
//! split is reproducible), grid-searches each candidate family on the
//! training subset, refits each family's winning configuration, and
//! selects the candidate with the lowest validation RMSE. Candidate
//! failures are isolated: a family that cannot fit is logged and skipped,
//! and the run fails only when no family survives.

pub mod metrics;
pub mod report;
pub mod search;

pub use metrics::Metrics;
pub use search::SearchOutcome;

use crate::artifacts::ArtifactStore;
use crate::error::TrainError;
use crate::model::{RandomForestRegressor, Regressor, RidgeRegression};
use crate::pipeline::{FeatureMatrix, FeaturePipeline};
use crate::data::{RawTable, Record};
use ndarray::Axis;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Seed for the train/validation shuffle.
pub const SPLIT_SEED: u64 = 42;

/// Seed handed to stochastic models and the cross-validation fits.
pub const MODEL_SEED: u64 = 42;

/// One point in a candidate family's hyperparameter grid.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelConfig {
    Ridge {
        alpha: f64,
    },
    Forest {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
    },
}

fn format_param(v: f64) -> String {
    if v == v.trunc() && v.is_finite() {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

impl ModelConfig {
    /// Fit a fresh model with this configuration.
    pub fn fit(&self, x: &FeatureMatrix, y: &[f64], seed: u64) -> Result<Regressor, TrainError> {
        match *self {
            ModelConfig::Ridge { alpha } => {
                let mut model = RidgeRegression::new(alpha);
                model.fit(x, y)?;
                Ok(Regressor::Ridge(model))
            }
            ModelConfig::Forest {
                n_estimators,
                max_depth,
                min_samples_split,
                min_samples_leaf,
            } => {
                let mut model = RandomForestRegressor::new(n_estimators)
                    .with_max_depth(max_depth)
                    .with_min_samples_split(min_samples_split)
                    .with_min_samples_leaf(min_samples_leaf)
                    .with_random_state(seed);
                model.fit(x, y)?;
                Ok(Regressor::Forest(model))
            }
        }
    }

    /// Hyperparameters as name → rendered value, for reports and the
    /// persisted results file.
    pub fn params(&self) -> BTreeMap<String, String> {
        match *self {
            ModelConfig::Ridge { alpha } => {
                BTreeMap::from([("alpha".to_string(), format_param(alpha))])
            }
            ModelConfig::Forest {
                n_estimators,
                max_depth,
                min_samples_split,
                min_samples_leaf,
            } => BTreeMap::from([
                ("n_estimators".to_string(), n_estimators.to_string()),
                (
                    "max_depth".to_string(),
                    max_depth.map_or_else(|| "None".to_string(), |d| d.to_string()),
                ),
                (
                    "min_samples_split".to_string(),
                    min_samples_split.to_string(),
                ),
                ("min_samples_leaf".to_string(), min_samples_leaf.to_string()),
            ]),
        }
    }

    /// One-line rendering for logs.
    pub fn describe(&self) -> String {
        self.params()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A candidate family: a name, its grid, and how many folds its search
/// uses.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub grid: Vec<ModelConfig>,
    pub cv_folds: usize,
}

/// The standard candidate set: a ridge sweep over seven decades of alpha
/// and a full random-forest grid.
pub fn default_candidates() -> Vec<Candidate> {
    let ridge_grid = [0.001, 0.01, 0.1, 1.0, 10.0, 100.0, 1000.0]
        .iter()
        .map(|&alpha| ModelConfig::Ridge { alpha })
        .collect();

    let mut forest_grid = Vec::new();
    for &n_estimators in &[100, 200, 300] {
        for &max_depth in &[Some(10), Some(20), Some(30), None] {
            for &min_samples_split in &[2, 5, 10] {
                for &min_samples_leaf in &[1, 2, 4] {
                    forest_grid.push(ModelConfig::Forest {
                        n_estimators,
                        max_depth,
                        min_samples_split,
                        min_samples_leaf,
                    });
                }
            }
        }
    }

    vec![
        Candidate {
            name: "Ridge Regression".to_string(),
            grid: ridge_grid,
            cv_folds: 5,
        },
        Candidate {
            name: "Random Forest".to_string(),
            grid: forest_grid,
            cv_folds: 3,
        },
    ]
}

/// Shuffle `0..n` with the given seed and split off the trailing
/// validation slice. The validation slice always keeps at least one row
/// and leaves at least one row for training (for `n >= 2`).
pub fn split_indices(n: usize, validation_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let val_len = ((n as f64) * validation_fraction).round() as usize;
    let val_len = val_len.clamp(1, n.saturating_sub(1).max(1));
    let val = indices.split_off(n - val_len.min(n));
    (indices, val)
}

/// One fully trained candidate: the refitted winning model and its
/// evaluation record.
#[derive(Debug, Clone)]
pub struct TrainedCandidate {
    pub name: String,
    pub model: Regressor,
    pub metrics: Metrics,
}

/// Outcome of a whole training run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub candidates: Vec<TrainedCandidate>,
    best_index: usize,
}

impl TrainingRun {
    /// The candidate with the lowest validation RMSE. Ties keep the
    /// candidate trained first.
    pub fn best(&self) -> &TrainedCandidate {
        &self.candidates[self.best_index]
    }

    /// Serializable summary for the results file.
    pub fn summary(&self) -> TrainingResults {
        TrainingResults {
            best_model: self.best().name.clone(),
            models: self
                .candidates
                .iter()
                .map(|c| (c.name.clone(), c.metrics.clone()))
                .collect(),
        }
    }
}

/// The persisted, JSON-facing shape of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResults {
    pub best_model: String,
    pub models: BTreeMap<String, Metrics>,
}

/// Orchestrates split, per-candidate search, refit, and selection.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    validation_fraction: f64,
    split_seed: u64,
    model_seed: u64,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self {
            validation_fraction: 0.2,
            split_seed: SPLIT_SEED,
            model_seed: MODEL_SEED,
        }
    }
}

impl ModelTrainer {
    /// Trainer with the standard 80/20 split and fixed seeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the held-out validation fraction (exclusive 0..1).
    pub fn with_validation_fraction(mut self, fraction: f64) -> Self {
        self.validation_fraction = fraction;
        self
    }

    /// Override the shuffle seed for the train/validation split.
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    /// Train every candidate and select the best by validation RMSE.
    pub fn run(
        &self,
        matrix: &FeatureMatrix,
        target: &[f64],
        candidates: &[Candidate],
    ) -> Result<TrainingRun, TrainError> {
        let n = matrix.nrows();
        if n < 2 {
            return Err(TrainError::Fit(format!(
                "need at least two rows to train, got {n}"
            )));
        }

        let (train_rows, val_rows) = split_indices(n, self.validation_fraction, self.split_seed);
        let x_train = matrix.select(Axis(0), &train_rows);
        let y_train: Vec<f64> = train_rows.iter().map(|&i| target[i]).collect();
        let x_val = matrix.select(Axis(0), &val_rows);
        let y_val: Vec<f64> = val_rows.iter().map(|&i| target[i]).collect();
        info!(
            rows = n,
            train = train_rows.len(),
            validation = val_rows.len(),
            "split training data"
        );

        let mut trained: Vec<TrainedCandidate> = Vec::new();
        for candidate in candidates {
            let started = Instant::now();
            match self.train_candidate(candidate, &x_train, &y_train, &x_val, &y_val) {
                Ok(mut item) => {
                    item.metrics.training_time_secs = started.elapsed().as_secs_f64();
                    info!(
                        name = %item.name,
                        val_rmse = item.metrics.val_rmse,
                        val_r2 = item.metrics.val_r2,
                        secs = item.metrics.training_time_secs,
                        "trained candidate"
                    );
                    trained.push(item);
                }
                Err(error) => {
                    warn!(name = %candidate.name, %error, "candidate failed, continuing");
                }
            }
        }

        if trained.is_empty() {
            return Err(TrainError::NoCandidates);
        }

        let mut best_index = 0;
        for (index, candidate) in trained.iter().enumerate().skip(1) {
            // Strictly lower, so ties keep the earlier candidate.
            if candidate.metrics.val_rmse < trained[best_index].metrics.val_rmse {
                best_index = index;
            }
        }
        info!(best = %trained[best_index].name, "selected best candidate");

        Ok(TrainingRun {
            candidates: trained,
            best_index,
        })
    }

    fn train_candidate(
        &self,
        candidate: &Candidate,
        x_train: &FeatureMatrix,
        y_train: &[f64],
        x_val: &FeatureMatrix,
        y_val: &[f64],
    ) -> Result<TrainedCandidate, TrainError> {
        let outcome = search::grid_search(
            x_train,
            y_train,
            &candidate.grid,
            candidate.cv_folds,
            self.model_seed,
            &candidate.name,
        )?;
        info!(
            name = %candidate.name,
            config = %outcome.config.describe(),
            cv_score = outcome.score,
            "search settled"
        );

        let model = outcome.config.fit(x_train, y_train, self.model_seed)?;
        let train_preds = model.predict(x_train);
        let val_preds = model.predict(x_val);

        let evaluation = Metrics {
            train_rmse: metrics::rmse(y_train, &train_preds),
            train_mae: metrics::mae(y_train, &train_preds),
            train_r2: metrics::r2(y_train, &train_preds),
            val_rmse: metrics::rmse(y_val, &val_preds),
            val_mae: metrics::mae(y_val, &val_preds),
            val_r2: metrics::r2(y_val, &val_preds),
            training_time_secs: 0.0,
            best_params: outcome.config.params(),
        };

        Ok(TrainedCandidate {
            name: candidate.name.clone(),
            model,
            metrics: evaluation,
        })
    }
}

/// End-to-end training entry point: load the training CSV, fit the
/// feature pipeline, train and select over the standard candidates, and
/// persist every artifact to `out_dir`. If a held-out CSV is given it is
/// transformed through the fitted state as a schema check.
pub fn run_full_training(
    train_path: &Path,
    test_path: Option<&Path>,
    out_dir: &Path,
) -> Result<TrainingRun, TrainError> {
    let table = RawTable::from_csv_path(train_path).map_err(|e| TrainError::Ingest {
        path: train_path.display().to_string(),
        message: e.to_string(),
    })?;
    info!(rows = table.n_rows(), cols = table.n_cols(), "loaded training table");

    let pipeline = FeaturePipeline::new();
    let fit = pipeline.fit(&table)?;
    info!(features = fit.state.n_features(), "fitted feature pipeline");

    let trainer = ModelTrainer::new();
    let run = trainer.run(&fit.matrix, &fit.target, &default_candidates())?;

    if let Some(path) = test_path {
        let held_out = RawTable::from_csv_path(path).map_err(|e| TrainError::Ingest {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let records: Vec<Record> = (0..held_out.n_rows()).map(|i| held_out.record(i)).collect();
        let transformed = pipeline.apply(&records, &fit.state)?;
        info!(
            rows = transformed.nrows(),
            features = transformed.ncols(),
            "transformed held-out table"
        );
    }

    let store = ArtifactStore::new(out_dir);
    store.save_run(&run, &fit.state)?;
    info!(dir = %out_dir.display(), "persisted artifacts");

    Ok(run)
}
