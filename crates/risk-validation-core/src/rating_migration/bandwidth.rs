//! Matrix weighted bandwidth of rating migrations.
//!
//! Distance-weighted measures of how far upgrades and downgrades land from
//! the no-change diagonal, normalised separately over the upper and lower
//! triangles. The indices are dimensionless and meant for trend comparison
//! across reporting periods, not absolute thresholds.

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::RiskValidationError;
use crate::tabulate::CrossTab;
use crate::RiskValidationResult;

/// Upper and lower weighted-bandwidth indices with their normalisers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationBandwidthOutput {
    /// Sorted rating categories shared by both axes.
    pub categories: Vec<String>,
    /// Normaliser over the upper triangle (upgrade side).
    pub upper_normalizer: f64,
    /// Normaliser over the lower triangle (downgrade side).
    pub lower_normalizer: f64,
    /// Distance-weighted upgrade index.
    pub upper_bandwidth: f64,
    /// Distance-weighted downgrade index.
    pub lower_bandwidth: f64,
}

/// Weighted-bandwidth statistics of the transition matrix built from paired
/// initial/final rating columns.
pub fn migration_bandwidth(
    data: &Dataset,
    initial_ratings_col: &str,
    final_ratings_col: &str,
) -> RiskValidationResult<MigrationBandwidthOutput> {
    if data.is_empty() {
        return Err(RiskValidationError::EmptyDataset);
    }
    let initial = data.categorical(initial_ratings_col)?;
    let current = data.categorical(final_ratings_col)?;
    let tab = CrossTab::from_pairs(&initial, &current, initial_ratings_col, final_ratings_col)?;

    let k = tab.size();
    let probabilities = tab.row_probabilities();
    let totals: Vec<f64> = tab.row_totals.iter().map(|&t| t as f64).collect();

    // Row weight with 1-based i: max(i - K, i - 1). The first row weighs
    // zero on the upgrade side, the last row dominates the downgrade side.
    let weight = |i: usize| (i as f64 - 1.0).max(i as f64 - k as f64);

    let mut upper_normalizer = 0.0;
    for i in 1..k {
        let above: f64 = probabilities[i - 1][i..].iter().sum();
        upper_normalizer += weight(i) * totals[i - 1] * above;
    }
    let mut lower_normalizer = 0.0;
    for i in 2..=k {
        let below: f64 = probabilities[i - 1][..i - 1].iter().sum();
        lower_normalizer += weight(i) * totals[i - 1] * below;
    }
    if upper_normalizer == 0.0 {
        return Err(RiskValidationError::DivisionByZero {
            context: "upper bandwidth normaliser (no weighted mass above the diagonal)"
                .to_string(),
        });
    }
    if lower_normalizer == 0.0 {
        return Err(RiskValidationError::DivisionByZero {
            context: "lower bandwidth normaliser (no weighted mass below the diagonal)"
                .to_string(),
        });
    }

    let mut upper_sum = 0.0;
    for i in 1..k {
        for j in (i + 1)..=k {
            upper_sum += (j - i) as f64 * totals[i - 1] * probabilities[i - 1][j - 1];
        }
    }
    let mut lower_sum = 0.0;
    for i in 2..=k {
        for j in 1..i {
            lower_sum += (i - j) as f64 * totals[i - 1] * probabilities[i - 1][j - 1];
        }
    }

    Ok(MigrationBandwidthOutput {
        categories: tab.categories,
        upper_normalizer,
        lower_normalizer,
        upper_bandwidth: upper_sum / upper_normalizer,
        lower_bandwidth: lower_sum / lower_normalizer,
    })
}
