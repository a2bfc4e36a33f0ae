//! Residential sale price estimation.
//!
//! Three components, used in sequence:
//!
//! - [`pipeline::FeaturePipeline`] turns raw property records into
//!   fixed-order numeric feature vectors, capturing every statistic it
//!   needs into an immutable [`pipeline::PipelineState`];
//! - [`train::ModelTrainer`] grid-searches the candidate model families
//!   and selects the one with the lowest validation RMSE;
//! - [`serve::PredictionService`] loads the persisted state and model
//!   and answers point predictions, with confidence bounds when the
//!   model is an ensemble.
//!
//! Training-time and serving-time features go through the identical
//! transform sequence against the same stored state, so a record seen at
//! fit time transforms to the same vector at serve time.
//!
//! ```no_run
//! use homeval::serve::PredictionService;
//! use homeval::data::Record;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = PredictionService::open("models")?;
//! let record = Record::new()
//!     .set("TotalBsmtSF", 856.0)
//!     .set("FirstFlrSF", 856.0)
//!     .set("SecondFlrSF", 854.0)
//!     .set("FullBath", 2.0)
//!     .set("HalfBath", 1.0)
//!     .set("BsmtFullBath", 1.0)
//!     .set("BsmtHalfBath", 0.0)
//!     .set("YrSold", 2008.0)
//!     .set("YearBuilt", 2003.0)
//!     .set("YearRemodAdd", 2003.0);
//! let result = service.predict_with_confidence(&record)?;
//! println!("estimate: {:.0}", result.prediction);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod serve;
pub mod train;

pub use artifacts::ArtifactStore;
pub use data::{RawTable, RawValue, Record};
pub use error::{ArtifactError, PipelineError, ServeError, TrainError};
pub use model::Regressor;
pub use pipeline::{FeatureMatrix, FeaturePipeline, FeatureVector, PipelineState};
pub use serve::{PredictionResult, PredictionService};
pub use train::{run_full_training, ModelTrainer, TrainingRun};
