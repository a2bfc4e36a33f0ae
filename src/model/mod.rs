//! Trained regressor variants.
//!
//! [`Regressor`] is a closed tagged union over the candidate families.
//! Whether confidence bounds are computable is a property of the variant,
//! not something probed at runtime: only the ensemble variant answers
//! [`Regressor::sub_predictions`] with `Some`, and the serving layer
//! dispatches on that.

pub mod forest;
pub mod ridge;

pub use forest::{DecisionTreeRegressor, RandomForestRegressor};
pub use ridge::RidgeRegression;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// A fitted regressor of one of the candidate families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Regressor {
    /// Point estimator: a single prediction, no ensemble spread.
    Ridge(RidgeRegression),
    /// Ensemble estimator: exposes per-sub-estimator predictions.
    Forest(RandomForestRegressor),
}

impl Regressor {
    /// Human-readable family name, used in reports and artifact names.
    pub fn family(&self) -> &'static str {
        match self {
            Regressor::Ridge(_) => "Ridge Regression",
            Regressor::Forest(_) => "Random Forest",
        }
    }

    /// Predict one feature row.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        match self {
            Regressor::Ridge(m) => m.predict_row(row),
            Regressor::Forest(m) => m.predict_row(row),
        }
    }

    /// Predict every row of a feature matrix.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<f64> {
        match self {
            Regressor::Ridge(m) => m.predict(x),
            Regressor::Forest(m) => m.predict(x),
        }
    }

    /// Per-sub-estimator predictions for one row, if this variant is an
    /// ensemble. `None` means "no interval is computable", by design.
    pub fn sub_predictions(&self, row: ArrayView1<f64>) -> Option<Vec<f64>> {
        match self {
            Regressor::Ridge(_) => None,
            Regressor::Forest(m) => Some(m.tree_predictions(row)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fitted_pair() -> (Regressor, Regressor) {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];

        let mut ridge = RidgeRegression::new(0.01);
        ridge.fit(&x, &y).unwrap();

        let mut forest = RandomForestRegressor::new(10).with_random_state(5);
        forest.fit(&x, &y).unwrap();

        (Regressor::Ridge(ridge), Regressor::Forest(forest))
    }

    #[test]
    fn family_names() {
        let (ridge, forest) = fitted_pair();
        assert_eq!(ridge.family(), "Ridge Regression");
        assert_eq!(forest.family(), "Random Forest");
    }

    #[test]
    fn point_estimator_has_no_sub_predictions() {
        let (ridge, _) = fitted_pair();
        assert!(ridge.sub_predictions(array![3.0].view()).is_none());
    }

    #[test]
    fn ensemble_exposes_sub_predictions() {
        let (_, forest) = fitted_pair();
        let subs = forest.sub_predictions(array![3.0].view()).unwrap();
        assert_eq!(subs.len(), 10);

        let mean = subs.iter().sum::<f64>() / subs.len() as f64;
        assert!((mean - forest.predict_row(array![3.0].view())).abs() < 1e-12);
    }

    #[test]
    fn enum_round_trips_through_bincode() {
        let (ridge, forest) = fitted_pair();
        for model in [ridge, forest] {
            let bytes = bincode::serialize(&model).unwrap();
            let restored: Regressor = bincode::deserialize(&bytes).unwrap();
            assert_eq!(restored, model);
        }
    }
}
