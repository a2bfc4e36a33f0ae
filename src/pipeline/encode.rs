//! Categorical encoding.
//!
//! Each distinct category value seen at fit time gets a unique
//! non-negative integer code, assigned in first-seen row order. The order
//! is stored with the map, so encodings are reproducible as long as fit
//! input row order is stable. At inference a value never seen at fit time
//! maps to the [`UNSEEN_CODE`] sentinel; it is never an error.

use serde::{Deserialize, Serialize};

/// Code assigned to category values absent from the fitted map.
pub const UNSEEN_CODE: i64 = -1;

/// Fitted category → code map for one column.
///
/// Only the category list is persisted; a value's code is its position in
/// the list. Column cardinalities here are small (a few dozen), so the
/// positional lookup is cheap and the serialized form stays canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    categories: Vec<String>,
}

impl CategoryMap {
    /// Learn the map from fit-time values, assigning codes in first-seen
    /// order.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut categories: Vec<String> = Vec::new();
        for value in values {
            if !categories.iter().any(|c| c == value) {
                categories.push(value.to_string());
            }
        }
        Self { categories }
    }

    /// Code for a value: its fit-time position, or [`UNSEEN_CODE`].
    pub fn code(&self, value: &str) -> i64 {
        self.categories
            .iter()
            .position(|c| c == value)
            .map(|p| p as i64)
            .unwrap_or(UNSEEN_CODE)
    }

    /// The category values in code order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of distinct categories seen at fit time.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True if no categories were seen.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_first_seen_order() {
        let map = CategoryMap::fit(["RL", "RM", "RL", "FV"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.code("RL"), 0);
        assert_eq!(map.code("RM"), 1);
        assert_eq!(map.code("FV"), 2);
    }

    #[test]
    fn unseen_value_maps_to_sentinel() {
        let map = CategoryMap::fit(["RL", "RM"]);
        assert_eq!(map.code("C (all)"), UNSEEN_CODE);
    }

    #[test]
    fn round_trip_preserves_codes() {
        let map = CategoryMap::fit(["Gable", "Hip", "Flat"]);
        let bytes = bincode::serialize(&map).unwrap();
        let restored: CategoryMap = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored, map);
        assert_eq!(restored.code("Hip"), 1);
        assert_eq!(restored.code("Mansard"), UNSEEN_CODE);
    }

    #[test]
    fn empty_fit_maps_everything_unseen() {
        let map = CategoryMap::fit(std::iter::empty::<&str>());
        assert!(map.is_empty());
        assert_eq!(map.code("anything"), UNSEEN_CODE);
    }
}
