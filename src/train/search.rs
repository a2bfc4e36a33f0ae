//! k-fold cross-validated grid search over one candidate family.
//!
//! Folds are contiguous row ranges in the (already shuffled) training
//! subset. Each configuration is scored by mean negative MSE across its
//! folds; configurations are evaluated in parallel on the rayon pool and
//! scores are re-read in grid order, so a tie keeps the configuration
//! listed first. A configuration that fails to fit on any fold is
//! discarded rather than failing the search; the search itself fails only
//! when every configuration was discarded.

use crate::error::TrainError;
use crate::train::ModelConfig;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use tracing::debug;

/// Winning configuration and its cross-validation score (negative MSE,
/// higher is better).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub config: ModelConfig,
    pub score: f64,
}

/// Half-open `(start, end)` row ranges partitioning `n` rows into
/// `folds` contiguous folds, the remainder spread over the leading folds.
pub(crate) fn fold_bounds(n: usize, folds: usize) -> Vec<(usize, usize)> {
    let base = n / folds;
    let extra = n % folds;
    let mut bounds = Vec::with_capacity(folds);
    let mut start = 0;
    for k in 0..folds {
        let len = base + usize::from(k < extra);
        bounds.push((start, start + len));
        start += len;
    }
    bounds
}

fn cross_val_neg_mse(
    x: &Array2<f64>,
    y: &[f64],
    folds: usize,
    config: &ModelConfig,
    seed: u64,
) -> Result<f64, TrainError> {
    let n = x.nrows();
    let mut total = 0.0;

    for (lo, hi) in fold_bounds(n, folds) {
        let train_rows: Vec<usize> = (0..lo).chain(hi..n).collect();
        let held_rows: Vec<usize> = (lo..hi).collect();

        let x_train = x.select(Axis(0), &train_rows);
        let y_train: Vec<f64> = train_rows.iter().map(|&i| y[i]).collect();
        let x_held = x.select(Axis(0), &held_rows);

        let model = config.fit(&x_train, &y_train, seed)?;
        let preds = model.predict(&x_held);
        let mse = held_rows
            .iter()
            .zip(&preds)
            .map(|(&i, p)| (y[i] - p).powi(2))
            .sum::<f64>()
            / held_rows.len() as f64;
        total -= mse;
    }

    Ok(total / folds as f64)
}

/// Score every configuration and return the best one.
pub fn grid_search(
    x: &Array2<f64>,
    y: &[f64],
    configs: &[ModelConfig],
    folds: usize,
    seed: u64,
    candidate: &str,
) -> Result<SearchOutcome, TrainError> {
    if configs.is_empty() {
        return Err(TrainError::SearchExhausted {
            candidate: candidate.to_string(),
            reason: "empty hyperparameter grid".to_string(),
        });
    }
    let folds = folds.min(x.nrows());
    if folds < 2 {
        return Err(TrainError::SearchExhausted {
            candidate: candidate.to_string(),
            reason: format!("{} rows is too few for cross-validation", x.nrows()),
        });
    }

    let scores: Vec<Result<f64, TrainError>> = configs
        .par_iter()
        .map(|config| cross_val_neg_mse(x, y, folds, config, seed))
        .collect();

    let mut best: Option<(usize, f64)> = None;
    let mut last_failure = None;
    for (index, scored) in scores.into_iter().enumerate() {
        match scored {
            Ok(score) => {
                debug!(config = %configs[index].describe(), score, "scored configuration");
                // Strictly greater, so the earliest of tied scores wins.
                if best.is_none_or(|(_, current)| score > current) {
                    best = Some((index, score));
                }
            }
            Err(error) => {
                debug!(config = %configs[index].describe(), %error, "configuration discarded");
                last_failure = Some(error);
            }
        }
    }

    match best {
        Some((index, score)) => Ok(SearchOutcome {
            config: configs[index].clone(),
            score,
        }),
        None => Err(TrainError::SearchExhausted {
            candidate: candidate.to_string(),
            reason: last_failure
                .map(|error| error.to_string())
                .unwrap_or_else(|| "no configuration could be scored".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn linear_data(n: usize) -> (Array2<f64>, Vec<f64>) {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = (0..n).map(|i| 3.0 * i as f64 + 1.0).collect();
        (x, y)
    }

    #[test]
    fn fold_bounds_partition_all_rows() {
        let bounds = fold_bounds(10, 3);
        assert_eq!(bounds, vec![(0, 4), (4, 7), (7, 10)]);

        let bounds = fold_bounds(9, 3);
        assert_eq!(bounds, vec![(0, 3), (3, 6), (6, 9)]);
    }

    #[test]
    fn search_prefers_the_better_fit() {
        let (x, y) = linear_data(20);
        let configs = vec![
            ModelConfig::Ridge { alpha: 1e6 },
            ModelConfig::Ridge { alpha: 1e-6 },
        ];

        let outcome = grid_search(&x, &y, &configs, 4, 42, "ridge").unwrap();
        assert_eq!(outcome.config, ModelConfig::Ridge { alpha: 1e-6 });
    }

    #[test]
    fn tied_scores_keep_the_first_configuration() {
        let (x, y) = linear_data(12);
        // Identical configurations produce identical scores.
        let configs = vec![
            ModelConfig::Ridge { alpha: 0.5 },
            ModelConfig::Ridge { alpha: 0.5 },
        ];

        let outcome = grid_search(&x, &y, &configs, 3, 42, "ridge").unwrap();
        assert_eq!(outcome.config, configs[0]);
    }

    #[test]
    fn empty_grid_is_exhausted() {
        let (x, y) = linear_data(10);
        let result = grid_search(&x, &y, &[], 3, 42, "ridge");
        assert!(matches!(result, Err(TrainError::SearchExhausted { .. })));
    }

    #[test]
    fn too_few_rows_is_exhausted() {
        let (x, y) = linear_data(1);
        let configs = vec![ModelConfig::Ridge { alpha: 1.0 }];
        let result = grid_search(&x, &y, &configs, 5, 42, "ridge");
        assert!(matches!(result, Err(TrainError::SearchExhausted { .. })));
    }
}
