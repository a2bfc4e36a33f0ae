//! L2-regularized linear regression.
//!
//! Fit by the closed-form normal equations on centered data, so the
//! intercept is not penalized:
//!
//! ```text
//! w = (Xcᵀ Xc + αI)⁻¹ Xcᵀ yc,    b = ȳ − x̄ᵀw
//! ```
//!
//! A Cholesky factorization solves the system; for α > 0 the matrix is
//! positive definite. A factorization that fails (the system is not
//! positive definite) surfaces as a fit error the trainer can isolate.
//! Note that a merely singular Gram matrix at α = 0 may still factor
//! numerically; the fit then succeeds with one of the solutions.

use crate::error::TrainError;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Ridge regressor. Unfitted until [`RidgeRegression::fit`] succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    alpha: f64,
    weights: Vec<f64>,
    intercept: f64,
}

impl RidgeRegression {
    /// Create an unfitted ridge regressor with the given penalty.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            weights: Vec::new(),
            intercept: 0.0,
        }
    }

    /// The regularization strength.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fitted coefficients, one per feature.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Fitted intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Fit on a feature matrix and target vector.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<(), TrainError> {
        let (n, p) = x.dim();
        if n == 0 || p == 0 {
            return Err(TrainError::Fit("empty training matrix".to_string()));
        }
        if n != y.len() {
            return Err(TrainError::Fit(format!(
                "target length {} does not match {} rows",
                y.len(),
                n
            )));
        }

        let x_mean: Vec<f64> = (0..p).map(|j| x.column(j).sum() / n as f64).collect();
        let y_mean = y.iter().sum::<f64>() / n as f64;

        let xc = DMatrix::from_fn(n, p, |i, j| x[[i, j]] - x_mean[j]);
        let yc = DVector::from_fn(n, |i, _| y[i] - y_mean);

        let gram = xc.transpose() * &xc + DMatrix::identity(p, p) * self.alpha;
        let moment = xc.transpose() * yc;

        let chol = gram.cholesky().ok_or_else(|| {
            TrainError::Fit("ridge normal equations are not positive definite".to_string())
        })?;
        let w = chol.solve(&moment);

        self.intercept = y_mean
            - x_mean
                .iter()
                .zip(w.iter())
                .map(|(m, wi)| m * wi)
                .sum::<f64>();
        self.weights = w.iter().copied().collect();
        Ok(())
    }

    /// Predict one feature row.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(self.weights.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }

    /// Predict every row of a feature matrix.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}
