//! Regression evaluation metrics.
//!
//! RMSE and MAE are reported in target units (currency); R² is unitless.
//! A training run computes all three on both the training subset
//! (diagnostic) and the validation subset, but only validation RMSE
//! drives model selection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root mean squared error.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n as f64;
    mse.sqrt()
}

/// Mean absolute error.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64
}

/// Coefficient of determination. A constant target scores 1.0 only for a
/// perfect fit, 0.0 otherwise.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Evaluation record for one trained candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub train_rmse: f64,
    pub train_mae: f64,
    pub train_r2: f64,
    pub val_rmse: f64,
    pub val_mae: f64,
    pub val_r2: f64,
    /// Wall-clock fit time, including the hyperparameter search.
    pub training_time_secs: f64,
    /// The hyperparameters the search settled on.
    pub best_params: BTreeMap<String, String>,
}
