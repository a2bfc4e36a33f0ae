//! Plain-text comparison report for a finished training run.

use crate::train::TrainingRun;

/// One line of the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub name: String,
    pub val_rmse: f64,
    pub val_mae: f64,
    pub val_r2: f64,
    pub training_time_secs: f64,
    pub best: bool,
}

/// Rows in training order, the selected candidate flagged.
pub fn comparison_rows(run: &TrainingRun) -> Vec<ComparisonRow> {
    let best_name = run.best().name.clone();
    run.candidates
        .iter()
        .map(|c| ComparisonRow {
            name: c.name.clone(),
            val_rmse: c.metrics.val_rmse,
            val_mae: c.metrics.val_mae,
            val_r2: c.metrics.val_r2,
            training_time_secs: c.metrics.training_time_secs,
            best: c.name == best_name,
        })
        .collect()
}

/// Render the run as an aligned text table. The selected candidate is
/// marked with `*`.
pub fn render_table(run: &TrainingRun) -> String {
    let rows = comparison_rows(run);
    let name_width = rows
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("Model".len()))
        .max()
        .unwrap_or(5);

    let mut out = String::new();
    out.push_str(&format!(
        "  {:<name_width$}  {:>12}  {:>12}  {:>8}  {:>8}\n",
        "Model", "Val RMSE", "Val MAE", "Val R2", "Time (s)"
    ));
    for row in &rows {
        let marker = if row.best { '*' } else { ' ' };
        out.push_str(&format!(
            "{marker} {:<name_width$}  {:>12.2}  {:>12.2}  {:>8.4}  {:>8.2}\n",
            row.name, row.val_rmse, row.val_mae, row.val_r2, row.training_time_secs
        ));
    }
    out
}
