//! Jeffreys prior backtest of PD calibration per rating grade.
//!
//! For each grade the defaults D out of N observations are set against the
//! mean predicted PD through the alpha-quantile of a Beta(D + 1/2, N - D + 1/2)
//! posterior. The grade passes when the quantile does not exceed the mean
//! predicted PD. A whole-book "Overall" row is appended after the grades.

use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};
use std::fmt;

use crate::dataset::Dataset;
use crate::error::RiskValidationError;
use crate::tabulate::group_rows;
use crate::types::TestOutcome;
use crate::RiskValidationResult;

/// Label of the whole-book row appended after the per-grade rows.
pub const OVERALL: &str = "Overall";

/// One per-grade result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JeffreysRow {
    /// Rating grade, or [`OVERALL`] for the appended whole-book row.
    pub rating: String,
    /// Mean predicted PD within the grade.
    pub pd_mean: f64,
    /// Observations in the grade.
    pub n: u64,
    /// Observed defaults in the grade.
    pub defaults: u64,
    /// Posterior shape a = D + 1/2.
    pub shape_a: f64,
    /// Posterior shape b = N - D + 1/2.
    pub shape_b: f64,
    /// Observed default rate D / N.
    pub default_rate: f64,
    /// Beta(a, b) quantile at the significance level.
    pub p_value: f64,
    pub outcome: TestOutcome,
}

/// Per-grade rows in sorted grade order with the "Overall" row last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JeffreysOutput {
    pub alpha: f64,
    pub rows: Vec<JeffreysRow>,
}

impl fmt::Display for JeffreysOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(
                f,
                "{}: PD={:.5}, N={}, D={}, default_rate={:.5}, p={:.5}, {}",
                row.rating, row.pd_mean, row.n, row.defaults, row.default_rate, row.p_value, row.outcome
            )?;
        }
        Ok(())
    }
}

/// Jeffreys test of PD calibration, per rating grade and overall.
pub fn jeffreys_test(
    data: &Dataset,
    ratings_col: &str,
    pd_col: &str,
    defaults_col: &str,
    alpha: f64,
) -> RiskValidationResult<JeffreysOutput> {
    if data.is_empty() {
        return Err(RiskValidationError::EmptyDataset);
    }
    check_alpha(alpha)?;
    let ratings = data.categorical(ratings_col)?;
    let pds = data.numeric(pd_col)?;
    let flags = data.numeric(defaults_col)?;
    check_probabilities(&pds, pd_col)?;
    check_flags(&flags, defaults_col)?;

    let mut rows = Vec::new();
    for (rating, indices) in group_rows(&ratings) {
        rows.push(grade_row(rating, &indices, &pds, &flags, alpha)?);
    }
    let whole_book: Vec<usize> = (0..data.len()).collect();
    rows.push(grade_row(OVERALL, &whole_book, &pds, &flags, alpha)?);

    Ok(JeffreysOutput { alpha, rows })
}

fn grade_row(
    rating: &str,
    indices: &[usize],
    pds: &[f64],
    flags: &[f64],
    alpha: f64,
) -> RiskValidationResult<JeffreysRow> {
    let n = indices.len() as u64;
    let defaults = indices.iter().map(|&i| flags[i]).sum::<f64>() as u64;
    let pd_mean = indices.iter().map(|&i| pds[i]).sum::<f64>() / indices.len() as f64;

    let shape_a = defaults as f64 + 0.5;
    let shape_b = (n - defaults) as f64 + 0.5;
    let posterior = Beta::new(shape_a, shape_b).map_err(|_| RiskValidationError::Numeric {
        context: format!("beta posterior for rating '{}'", rating),
    })?;
    let p_value = posterior.inverse_cdf(alpha);

    let outcome = if p_value <= pd_mean {
        TestOutcome::Pass
    } else {
        TestOutcome::Fail
    };

    Ok(JeffreysRow {
        rating: rating.to_string(),
        pd_mean,
        n,
        defaults,
        shape_a,
        shape_b,
        default_rate: defaults as f64 / n as f64,
        p_value,
        outcome,
    })
}

fn check_alpha(alpha: f64) -> RiskValidationResult<()> {
    if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
        return Err(RiskValidationError::InvalidInput {
            field: "alpha".to_string(),
            reason: "significance level must be strictly between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn check_probabilities(pds: &[f64], column: &str) -> RiskValidationResult<()> {
    for &p in pds {
        if !(0.0..=1.0).contains(&p) {
            return Err(RiskValidationError::InvalidInput {
                field: column.to_string(),
                reason: format!("predicted PD {} lies outside [0, 1]", p),
            });
        }
    }
    Ok(())
}

fn check_flags(flags: &[f64], column: &str) -> RiskValidationResult<()> {
    for &flag in flags {
        if flag != 0.0 && flag != 1.0 {
            return Err(RiskValidationError::InvalidInput {
                field: column.to_string(),
                reason: format!("default flag {} is not 0 or 1", flag),
            });
        }
    }
    Ok(())
}
