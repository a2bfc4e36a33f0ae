//! Feature standardization.
//!
//! Every feature is centered on its fit-time mean and divided by its
//! fit-time population standard deviation. The statistics are computed
//! once at fit, stored, and applied verbatim at inference — never
//! recomputed. Constant features (zero std) divide by 1 so they pass
//! through as zeros after centering.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Fitted per-feature mean and standard deviation, aligned to the
/// pipeline's feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl ScalerStats {
    /// Compute column means and population stds (ddof = 0).
    pub fn fit(matrix: &Array2<f64>) -> Self {
        let (rows, cols) = matrix.dim();
        let mut means = vec![0.0; cols];
        let mut stds = vec![1.0; cols];

        if rows == 0 {
            return Self { means, stds };
        }

        for col in 0..cols {
            let column = matrix.column(col);
            let mean = column.sum() / rows as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / rows as f64;
            let std = var.sqrt();

            means[col] = mean;
            stds[col] = if std == 0.0 { 1.0 } else { std };
        }

        Self { means, stds }
    }

    /// Standardize a matrix in place using the stored statistics.
    pub fn transform(&self, matrix: &mut Array2<f64>) {
        for mut row in matrix.rows_mut() {
            for (col, value) in row.iter_mut().enumerate() {
                *value = (*value - self.means[col]) / self.stds[col];
            }
        }
    }

    /// Number of features the scaler was fit on.
    pub fn n_features(&self) -> usize {
        self.means.len()
    }
}
