//! Cell-wise z-tests for the stability of a rating transition matrix.
//!
//! Each off-diagonal transition probability is compared against its
//! neighbour one column closer to the diagonal: the cell to the right below
//! the diagonal, the cell to the left above it. The null hypothesis is that
//! the neighbour probability is at least as large, so the lower-tail normal
//! probability of each z-statistic serves as a one-sided stability
//! indicator.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::dataset::Dataset;
use crate::error::RiskValidationError;
use crate::tabulate::CrossTab;
use crate::RiskValidationResult;

/// Transition matrix together with the per-cell stability statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStabilityOutput {
    /// Sorted rating categories shared by both axes.
    pub categories: Vec<String>,
    /// Observed transition counts N_ij.
    pub counts: Vec<Vec<u64>>,
    /// Per-initial-category totals N_i.
    pub row_totals: Vec<u64>,
    /// Row-normalized transition probabilities p_ij.
    pub probabilities: Vec<Vec<f64>>,
    /// z[i][j] per off-diagonal cell; NaN on the diagonal and wherever both
    /// compared probabilities are zero.
    pub z: Vec<Vec<f64>>,
    /// Lower-tail standard-normal probability of each z cell; NaN exactly
    /// where z is NaN.
    pub p_values: Vec<Vec<f64>>,
}

/// z-tests for the stability of the transition matrix built from paired
/// initial/final rating columns.
pub fn migration_stability(
    data: &Dataset,
    initial_ratings_col: &str,
    final_ratings_col: &str,
) -> RiskValidationResult<MigrationStabilityOutput> {
    if data.is_empty() {
        return Err(RiskValidationError::EmptyDataset);
    }
    let initial = data.categorical(initial_ratings_col)?;
    let current = data.categorical(final_ratings_col)?;
    let tab = CrossTab::from_pairs(&initial, &current, initial_ratings_col, final_ratings_col)?;

    let probabilities = tab.row_probabilities();
    let k = tab.size();
    let normal = Normal::new(0.0, 1.0).map_err(|_| RiskValidationError::Numeric {
        context: "standard normal reference distribution".to_string(),
    })?;

    let mut z = vec![vec![f64::NAN; k]; k];
    let mut p_values = vec![vec![f64::NAN; k]; k];
    for i in 0..k {
        let n_i = tab.row_totals[i] as f64;
        for j in 0..k {
            if i == j {
                continue;
            }
            // The compared neighbour sits one column closer to the diagonal,
            // so it is in range for every off-diagonal cell, the corner
            // cells included.
            let neighbour = if i > j { j + 1 } else { j - 1 };
            let p = probabilities[i][j];
            let q = probabilities[i][neighbour];
            let variance = (p * (1.0 - p) + q * (1.0 - q) + 2.0 * p * q) / n_i;
            let z_ij = (q - p) / variance.sqrt();
            z[i][j] = z_ij;
            p_values[i][j] = normal.cdf(z_ij);
        }
    }

    Ok(MigrationStabilityOutput {
        categories: tab.categories,
        counts: tab.counts,
        row_totals: tab.row_totals,
        probabilities,
        z,
        p_values,
    })
}
