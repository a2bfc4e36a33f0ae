//! Error taxonomy for the prediction system.
//!
//! Three failure classes cross component boundaries:
//! - [`PipelineError`] — raised by the feature pipeline; the only
//!   non-recoverable case is a record that lacks a column required by a
//!   derived-feature formula.
//! - [`TrainError`] — raised by a training run; individual candidate
//!   failures are isolated and logged, the run as a whole only fails when
//!   no candidate could be trained.
//! - [`ServeError`] — raised by the prediction service; missing or
//!   corrupt artifacts fail at construction, before any prediction.
//!
//! Unknown categorical values are *not* an error anywhere: the encoder
//! maps them to the `-1` sentinel.

use thiserror::Error;

/// Errors raised by [`crate::pipeline::FeaturePipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A raw field required by a derived-feature formula is absent from
    /// the record. This indicates a malformed caller payload rather than
    /// ordinary missingness, so it is reported instead of defaulted.
    #[error("schema error: required field `{field}` is absent")]
    Schema { field: String },

    /// The fit table has no rows.
    #[error("empty table: {0}")]
    EmptyTable(String),

    /// The fit table has no usable feature columns.
    #[error("no feature columns in fit table")]
    NoFeatures,

    /// The target column is missing from the fit table.
    #[error("target column `{0}` not found in fit table")]
    MissingTarget(String),
}

/// Errors raised by [`crate::train::ModelTrainer`].
#[derive(Debug, Error)]
pub enum TrainError {
    /// Every candidate family failed to fit or evaluate.
    #[error("training failed: no candidate model could be trained")]
    NoCandidates,

    /// A hyperparameter search produced no valid configuration for one
    /// candidate. Fatal to that candidate only.
    #[error("search for `{candidate}` yielded no valid configuration: {reason}")]
    SearchExhausted { candidate: String, reason: String },

    /// A single model fit failed (degenerate input, singular system).
    #[error("fit failed: {0}")]
    Fit(String),

    /// An input table could not be read.
    #[error("failed to read table `{path}`: {message}")]
    Ingest { path: String, message: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Errors raised by [`crate::serve::PredictionService`].
#[derive(Debug, Error)]
pub enum ServeError {
    /// No model/state bundle could be loaded. Surfaced eagerly at service
    /// construction; the actionable hint distinguishes "never trained"
    /// from malformed input.
    #[error("model not loaded: {reason} (run the training pipeline first)")]
    ModelNotLoaded { reason: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Errors raised while persisting or loading artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error on `{path}`: {message}")]
    Serialization { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_the_field() {
        let err = PipelineError::Schema {
            field: "TotalBsmtSF".to_string(),
        };
        assert!(err.to_string().contains("TotalBsmtSF"));
    }

    #[test]
    fn model_not_loaded_is_actionable() {
        let err = ServeError::ModelNotLoaded {
            reason: "best_model.bin missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("best_model.bin"));
        assert!(msg.contains("training pipeline"));
    }

    #[test]
    fn train_error_wraps_pipeline_error() {
        let err: TrainError = PipelineError::NoFeatures.into();
        assert!(matches!(err, TrainError::Pipeline(_)));
    }
}
