//! On-disk persistence for trained models and pipeline state.
//!
//! A training run writes one directory of artifacts:
//!
//! - `best_model.bin` — the selected [`Regressor`]
//! - `<candidate>.bin` — every trained candidate, snake_cased
//!   (`ridge_regression.bin`, `random_forest.bin`)
//! - `imputer.bin`, `label_encoders.bin`, `scaler.bin`,
//!   `feature_names.bin` — the pipeline state, split by concern
//! - `training_results.json` — human-inspectable metrics and the winner
//!
//! Binary artifacts are bincode; the results file is JSON so it can be
//! read without this crate. Loading reassembles a [`PipelineState`] from
//! the split files; a missing or corrupt file surfaces as
//! [`ArtifactError`] naming the path.

use crate::error::ArtifactError;
use crate::model::Regressor;
use crate::pipeline::{CategoryMap, PipelineState, ScalerStats};
use crate::train::{TrainingResults, TrainingRun};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const BEST_MODEL_FILE: &str = "best_model.bin";
pub const IMPUTER_FILE: &str = "imputer.bin";
pub const ENCODERS_FILE: &str = "label_encoders.bin";
pub const SCALER_FILE: &str = "scaler.bin";
pub const FEATURE_NAMES_FILE: &str = "feature_names.bin";
pub const RESULTS_FILE: &str = "training_results.json";

/// Imputation fill values, persisted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ImputerFills {
    numeric: BTreeMap<String, f64>,
    categorical: BTreeMap<String, String>,
}

/// `"Ridge Regression"` → `"ridge_regression"`.
fn artifact_stem(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// A directory of training artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn write_bincode<T: Serialize>(&self, file: &str, value: &T) -> Result<(), ArtifactError> {
        let path = self.path(file);
        let bytes = bincode::serialize(value).map_err(|e| ArtifactError::Serialization {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&path, bytes).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "wrote artifact");
        Ok(())
    }

    fn read_bincode<T: DeserializeOwned>(&self, file: &str) -> Result<T, ArtifactError> {
        let path = self.path(file);
        let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        bincode::deserialize(&bytes).map_err(|e| ArtifactError::Serialization {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Persist a whole training run: every candidate model, the winner
    /// under its fixed name, the pipeline state, and the results file.
    pub fn save_run(&self, run: &TrainingRun, state: &PipelineState) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        for candidate in &run.candidates {
            let file = format!("{}.bin", artifact_stem(&candidate.name));
            self.write_bincode(&file, &candidate.model)?;
        }
        self.write_bincode(BEST_MODEL_FILE, &run.best().model)?;

        self.write_bincode(
            IMPUTER_FILE,
            &ImputerFills {
                numeric: state.numeric_fill.clone(),
                categorical: state.categorical_fill.clone(),
            },
        )?;
        self.write_bincode(ENCODERS_FILE, &state.encoders)?;
        self.write_bincode(SCALER_FILE, &state.scaler)?;
        self.write_bincode(FEATURE_NAMES_FILE, &state.feature_names)?;

        let results_path = self.path(RESULTS_FILE);
        let json = serde_json::to_vec_pretty(&run.summary()).map_err(|e| {
            ArtifactError::Serialization {
                path: results_path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        fs::write(&results_path, json).map_err(|source| ArtifactError::Io {
            path: results_path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Reassemble the pipeline state from its split files.
    pub fn load_state(&self) -> Result<PipelineState, ArtifactError> {
        let fills: ImputerFills = self.read_bincode(IMPUTER_FILE)?;
        let encoders: BTreeMap<String, CategoryMap> = self.read_bincode(ENCODERS_FILE)?;
        let scaler: ScalerStats = self.read_bincode(SCALER_FILE)?;
        let feature_names: Vec<String> = self.read_bincode(FEATURE_NAMES_FILE)?;

        Ok(PipelineState {
            numeric_fill: fills.numeric,
            categorical_fill: fills.categorical,
            encoders,
            scaler,
            feature_names,
        })
    }

    /// Load the selected model.
    pub fn load_best_model(&self) -> Result<Regressor, ArtifactError> {
        self.read_bincode(BEST_MODEL_FILE)
    }

    /// Load one candidate by its display name.
    pub fn load_model(&self, name: &str) -> Result<Regressor, ArtifactError> {
        self.read_bincode(&format!("{}.bin", artifact_stem(name)))
    }

    /// Load the metrics summary.
    pub fn load_results(&self) -> Result<TrainingResults, ArtifactError> {
        let path = self.path(RESULTS_FILE);
        let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Serialization {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::{Candidate, ModelConfig, ModelTrainer};
    use ndarray::Array2;
    use tempfile::tempdir;

    fn sample_state() -> PipelineState {
        PipelineState {
            numeric_fill: BTreeMap::from([("LotFrontage".to_string(), 65.0)]),
            categorical_fill: BTreeMap::from([("MSZoning".to_string(), "RL".to_string())]),
            encoders: BTreeMap::from([(
                "MSZoning".to_string(),
                CategoryMap::fit(["RL", "RM"]),
            )]),
            scaler: ScalerStats {
                means: vec![65.0, 0.5],
                stds: vec![10.0, 0.5],
            },
            feature_names: vec!["LotFrontage".to_string(), "MSZoning".to_string()],
        }
    }

    fn sample_run() -> TrainingRun {
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
        let y: Vec<f64> = (0..30).map(|i| 3.0 * i as f64).collect();

        let candidates = vec![
            Candidate {
                name: "Ridge Regression".to_string(),
                grid: vec![ModelConfig::Ridge { alpha: 0.01 }],
                cv_folds: 3,
            },
            Candidate {
                name: "Random Forest".to_string(),
                grid: vec![ModelConfig::Forest {
                    n_estimators: 5,
                    max_depth: Some(3),
                    min_samples_split: 2,
                    min_samples_leaf: 1,
                }],
                cv_folds: 3,
            },
        ];
        ModelTrainer::new().run(&x, &y, &candidates).unwrap()
    }

    #[test]
    fn stem_is_snake_case() {
        assert_eq!(artifact_stem("Ridge Regression"), "ridge_regression");
        assert_eq!(artifact_stem("Random Forest"), "random_forest");
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let run = sample_run();
        let state = sample_state();

        store.save_run(&run, &state).unwrap();

        assert_eq!(store.load_state().unwrap(), state);
        assert_eq!(store.load_best_model().unwrap(), run.best().model);
        assert_eq!(
            store.load_model("Ridge Regression").unwrap(),
            run.candidates[0].model
        );

        let results = store.load_results().unwrap();
        assert_eq!(results.best_model, run.best().name);
        assert_eq!(results.models.len(), 2);
    }

    #[test]
    fn expected_files_exist_on_disk() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_run(&sample_run(), &sample_state()).unwrap();

        for file in [
            BEST_MODEL_FILE,
            "ridge_regression.bin",
            "random_forest.bin",
            IMPUTER_FILE,
            ENCODERS_FILE,
            SCALER_FILE,
            FEATURE_NAMES_FILE,
            RESULTS_FILE,
        ] {
            assert!(dir.path().join(file).exists(), "missing {file}");
        }
    }

    #[test]
    fn loading_from_empty_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.load_best_model().unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn corrupt_artifact_is_serialization_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SCALER_FILE), b"not bincode at all").unwrap();

        let store = ArtifactStore::new(dir.path());
        let err = store.read_bincode::<ScalerStats>(SCALER_FILE).unwrap_err();
        assert!(matches!(err, ArtifactError::Serialization { .. }));
    }
}
