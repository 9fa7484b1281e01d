//! Aggregation shared by the test functions: sorted category sets,
//! per-category counts, row grouping, and the rating-transition
//! cross-tabulation. Everything is built fresh per call and never persisted.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::RiskValidationError;
use crate::RiskValidationResult;

/// Sorted distinct categories with per-category observation counts.
pub fn category_counts(values: &[&str]) -> (Vec<String>, Vec<u64>) {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let categories = counts.keys().map(|c| c.to_string()).collect();
    let totals = counts.values().copied().collect();
    (categories, totals)
}

/// Row indices grouped by category, iterable in sorted category order.
pub fn group_rows<'a>(values: &[&'a str]) -> BTreeMap<&'a str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, v) in values.iter().enumerate() {
        groups.entry(v).or_default().push(idx);
    }
    groups
}

/// A K×K contingency table of rating transitions over one shared, sorted
/// category universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossTab {
    /// Sorted category labels; index i names the same grade on both axes.
    pub categories: Vec<String>,
    /// counts[i][j] = observations moving from categories[i] to categories[j].
    pub counts: Vec<Vec<u64>>,
    /// Per-initial-category totals; each is >= 1 because the categories come
    /// from the observations themselves.
    pub row_totals: Vec<u64>,
}

impl CrossTab {
    /// Cross-tabulate paired initial/final ratings.
    ///
    /// The two columns must share an identical category set: transitions are
    /// meaningless when the axes disagree, so a mismatch is rejected rather
    /// than assumed away. At least two categories are required.
    pub fn from_pairs(
        initial: &[&str],
        current: &[&str],
        initial_column: &str,
        final_column: &str,
    ) -> RiskValidationResult<Self> {
        let initial_set: BTreeSet<&str> = initial.iter().copied().collect();
        let current_set: BTreeSet<&str> = current.iter().copied().collect();
        if initial_set != current_set {
            return Err(RiskValidationError::CategoryMismatch {
                initial_column: initial_column.to_string(),
                final_column: final_column.to_string(),
            });
        }
        let k = initial_set.len();
        if k < 2 {
            return Err(RiskValidationError::InsufficientData(format!(
                "at least 2 rating categories are required, found {}",
                k
            )));
        }

        let index: BTreeMap<&str, usize> = initial_set
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i))
            .collect();
        let mut counts = vec![vec![0u64; k]; k];
        for (a, b) in initial.iter().zip(current.iter()) {
            counts[index[a]][index[b]] += 1;
        }
        let row_totals = counts.iter().map(|row| row.iter().sum()).collect();

        Ok(CrossTab {
            categories: initial_set.iter().map(|c| c.to_string()).collect(),
            counts,
            row_totals,
        })
    }

    /// Number of rating categories K.
    pub fn size(&self) -> usize {
        self.categories.len()
    }

    /// Row-normalized transition probabilities; each row sums to 1.
    pub fn row_probabilities(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .zip(self.row_totals.iter())
            .map(|(row, &total)| row.iter().map(|&c| c as f64 / total as f64).collect())
            .collect()
    }
}
