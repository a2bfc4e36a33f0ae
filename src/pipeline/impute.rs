//! Fit-time imputation statistics.
//!
//! Numeric columns are filled with the column median observed at fit
//! time, categorical columns with the most frequent value (ties broken by
//! first-seen order so the whole fit path stays order-stable). The
//! computed fill values are captured into the pipeline state and reused
//! verbatim at inference; nothing here is ever recomputed from
//! inference-time data.

use std::collections::HashMap;

/// Fallback fill when a numeric column has no observed values at all.
pub(crate) const EMPTY_NUMERIC_FILL: f64 = 0.0;

/// Sentinel fill when a categorical column has no observed values at all.
pub(crate) const EMPTY_CATEGORY_FILL: &str = "None";

/// Median of the given values, excluding nothing (callers filter missing
/// entries). Even-length inputs average the two middle values.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

/// Most frequent value; on a tie the value seen earliest wins.
pub(crate) fn mode_first_seen<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    // max_by_key keeps the last maximum, so scan explicitly: a later
    // value must be strictly more frequent to displace an earlier one.
    let mut best: Option<&str> = None;
    for value in order {
        match best {
            Some(current) if counts[value] <= counts[current] => {}
            _ => best = Some(value),
        }
    }
    best.map(|value| value.to_string())
}
