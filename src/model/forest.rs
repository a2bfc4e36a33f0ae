//! Random forest regression.
//!
//! A bagged ensemble of CART regression trees. Each tree fits a bootstrap
//! resample of the training rows; trees are grown greedily by variance
//! reduction over all features. Tree fitting is independent per tree and
//! runs on the rayon pool; every tree's RNG is seeded from the forest
//! seed plus the tree index, so results do not depend on thread schedule.
//!
//! The forest exposes its per-tree predictions ([`RandomForestRegressor::tree_predictions`]),
//! which is what makes ensemble confidence intervals possible downstream.

use crate::error::TrainError;
use ndarray::{Array2, ArrayView1};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimum sum-of-squares improvement for a split to be worth taking.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART regression tree, stored as a flat node arena with the
/// root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    nodes: Vec<Node>,
}

impl DecisionTreeRegressor {
    /// Create an unfitted tree.
    pub fn new(
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
    ) -> Self {
        Self {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            min_samples_leaf: min_samples_leaf.max(1),
            nodes: Vec::new(),
        }
    }

    /// Fit on the given row subset (bootstrap indices may repeat rows).
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[f64],
        indices: Vec<usize>,
    ) -> Result<(), TrainError> {
        if indices.is_empty() {
            return Err(TrainError::Fit("empty sample for tree fit".to_string()));
        }
        self.nodes.clear();
        self.grow(x, y, indices, 0);
        Ok(())
    }

    /// Number of nodes in the fitted tree.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn grow(&mut self, x: &Array2<f64>, y: &[f64], indices: Vec<usize>, depth: usize) -> usize {
        let n = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n as f64;

        let depth_exhausted = self.max_depth.is_some_and(|d| depth >= d);
        if n >= self.min_samples_split && !depth_exhausted {
            if let Some((feature, threshold)) = self.best_split(x, y, &indices) {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .into_iter()
                    .partition(|&i| x[[i, feature]] <= threshold);

                let id = self.nodes.len();
                self.nodes.push(Node::Leaf { value: mean }); // placeholder
                let left = self.grow(x, y, left_idx, depth + 1);
                let right = self.grow(x, y, right_idx, depth + 1);
                self.nodes[id] = Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
                return id;
            }
        }

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });
        id
    }

    /// Scan every feature for the split minimizing children
    /// sum-of-squares. Ties keep the earliest feature, which makes the
    /// tree deterministic for a fixed row sample.
    fn best_split(&self, x: &Array2<f64>, y: &[f64], indices: &[usize]) -> Option<(usize, f64)> {
        let n = indices.len();
        let p = x.ncols();

        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;
        if parent_sse <= MIN_GAIN {
            return None;
        }

        let mut best: Option<(f64, usize, f64)> = None; // (children sse, feature, threshold)

        let mut sorted = indices.to_vec();
        for feature in 0..p {
            sorted.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..n {
                let prev = sorted[k - 1];
                left_sum += y[prev];
                left_sq += y[prev] * y[prev];

                let prev_val = x[[prev, feature]];
                let next_val = x[[sorted[k], feature]];
                if prev_val == next_val {
                    continue;
                }
                if k < self.min_samples_leaf || n - k < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / k as f64;
                let right_sse = right_sq - right_sum * right_sum / (n - k) as f64;
                let children = left_sse + right_sse;

                if best.is_none_or(|(score, _, _)| children < score - MIN_GAIN) {
                    best = Some((children, feature, (prev_val + next_val) / 2.0));
                }
            }
        }

        best.and_then(|(children, feature, threshold)| {
            (parent_sse - children > MIN_GAIN).then_some((feature, threshold))
        })
    }

    /// Predict one feature row by walking the tree.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Bagged ensemble of regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    seed: u64,
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    /// Create an unfitted forest with the given ensemble size.
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 0,
            trees: Vec::new(),
        }
    }

    /// Limit tree depth. `None` grows trees until leaves are pure.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Minimum samples required to attempt a split.
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    /// Minimum samples each side of a split must keep.
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf.max(1);
        self
    }

    /// Seed for the bootstrap resampling.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of trees in the ensemble.
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Fit every tree on its own bootstrap resample. Trees fit in
    /// parallel over read-only data; each tree's RNG depends only on the
    /// forest seed and the tree index.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<(), TrainError> {
        let n = x.nrows();
        if n == 0 {
            return Err(TrainError::Fit("empty training matrix".to_string()));
        }
        if n != y.len() {
            return Err(TrainError::Fit(format!(
                "target length {} does not match {} rows",
                y.len(),
                n
            )));
        }

        let trees: Result<Vec<DecisionTreeRegressor>, TrainError> = (0..self.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
                let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

                let mut tree = DecisionTreeRegressor::new(
                    self.max_depth,
                    self.min_samples_split,
                    self.min_samples_leaf,
                );
                tree.fit(x, y, indices)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        Ok(())
    }

    /// Predict one row: the mean of all tree predictions.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Predict every row of a feature matrix.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Every sub-estimator's prediction for one row, in tree order.
    /// Evaluated in parallel; the trees are read-only and independent.
    pub fn tree_predictions(&self, row: ArrayView1<f64>) -> Vec<f64> {
        self.trees
            .par_iter()
            .map(|t| t.predict_row(row))
            .collect()
    }
}
