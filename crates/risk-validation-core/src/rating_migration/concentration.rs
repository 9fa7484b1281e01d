//! Herfindahl-type concentration of rating grades.
//!
//! A normalised coefficient-of-variation index summarises how evenly the
//! portfolio spreads across the K grades at the start and end of the period:
//! 0 for a uniform spread, 1 with everything in one grade. A
//! normal-approximation z-test then compares the two dispersions.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

use crate::dataset::Dataset;
use crate::error::RiskValidationError;
use crate::tabulate::CrossTab;
use crate::RiskValidationResult;

/// Concentration indices of the initial and final rating distributions and
/// the dispersion-comparison p-value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsConcentrationOutput {
    /// Number of customers or facilities.
    pub n: u64,
    /// Sorted rating categories shared by both columns.
    pub categories: Vec<String>,
    /// Coefficient of variation of the initial grade shares.
    pub initial_cv: f64,
    /// Coefficient of variation of the final grade shares.
    pub final_cv: f64,
    /// Herfindahl-type index of the initial distribution, in [0, 1].
    pub initial_index: f64,
    /// Herfindahl-type index of the final distribution, in [0, 1].
    pub final_index: f64,
    /// p-value of the test that dispersion has not decreased.
    pub p_value: f64,
}

impl fmt::Display for RatingsConcentrationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "initial_index={:.6}, final_index={:.6}, N={}, p={:.5}",
            self.initial_index, self.final_index, self.n, self.p_value
        )
    }
}

/// Concentration test over paired initial/final rating columns.
pub fn ratings_concentration(
    data: &Dataset,
    initial_ratings_col: &str,
    final_ratings_col: &str,
) -> RiskValidationResult<RatingsConcentrationOutput> {
    if data.is_empty() {
        return Err(RiskValidationError::EmptyDataset);
    }
    let initial = data.categorical(initial_ratings_col)?;
    let current = data.categorical(final_ratings_col)?;
    // One category universe for both distributions, like the rest of the
    // migration engine.
    let tab = CrossTab::from_pairs(&initial, &current, initial_ratings_col, final_ratings_col)?;

    let k = tab.size();
    let n = data.len();
    let n_f = n as f64;

    let initial_shares: Vec<f64> = tab.row_totals.iter().map(|&t| t as f64 / n_f).collect();
    let mut final_counts = vec![0u64; k];
    for row in &tab.counts {
        for (j, &c) in row.iter().enumerate() {
            final_counts[j] += c;
        }
    }
    let final_shares: Vec<f64> = final_counts.iter().map(|&t| t as f64 / n_f).collect();

    let initial_cv = coefficient_of_variation(&initial_shares, k);
    let final_cv = coefficient_of_variation(&final_shares, k);

    let denominator = (final_cv * final_cv * (0.5 + final_cv * final_cv)).sqrt();
    if denominator == 0.0 {
        return Err(RiskValidationError::DivisionByZero {
            context: "concentration dispersion comparison (uniform final distribution)"
                .to_string(),
        });
    }
    let z = ((k as f64) - 1.0).sqrt() * (final_cv - initial_cv) / denominator;
    let normal = Normal::new(0.0, 1.0).map_err(|_| RiskValidationError::Numeric {
        context: "standard normal reference distribution".to_string(),
    })?;
    let p_value = 1.0 - normal.cdf(z);

    Ok(RatingsConcentrationOutput {
        n: n as u64,
        categories: tab.categories,
        initial_cv,
        final_cv,
        initial_index: herfindahl_index(initial_cv, k),
        final_index: herfindahl_index(final_cv, k),
        p_value,
    })
}

/// CV = sqrt(K * sum((R_i - 1/K)^2)) over the grade shares.
fn coefficient_of_variation(shares: &[f64], k: usize) -> f64 {
    let k_f = k as f64;
    let spread: f64 = shares.iter().map(|r| (r - 1.0 / k_f) * (r - 1.0 / k_f)).sum();
    (k_f * spread).sqrt()
}

/// Index = 1 + ln((CV^2 + 1)/K) / ln(K), 0 at uniform, 1 at full
/// concentration.
fn herfindahl_index(cv: f64, k: usize) -> f64 {
    let k_f = k as f64;
    1.0 + ((cv * cv + 1.0) / k_f).ln() / k_f.ln()
}
