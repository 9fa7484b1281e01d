//! Two-sided t-test of ELBE accuracy.
//!
//! Null hypothesis: the expected loss best estimate equals realised LGD.
//! Deviations in either direction count against the estimate, so the paired
//! error is tested two-sided.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

use crate::dataset::Dataset;
use crate::error::RiskValidationError;
use crate::types::TestOutcome;
use crate::RiskValidationResult;

/// Result of the ELBE t-test. Field order mirrors the reporting contract:
/// count, observed mean, ELBE mean, statistic, variance, p-value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElbeTTestOutput {
    /// Number of paired observations.
    pub n: u64,
    /// Mean realised LGD.
    pub observed_mean: f64,
    /// Mean expected loss best estimate.
    pub elbe_mean: f64,
    /// t = sqrt(N) * mean(error) / sqrt(s2) with N - 1 degrees of freedom.
    pub t_stat: f64,
    /// Sample variance s2 of the paired errors.
    pub error_variance: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

impl ElbeTTestOutput {
    /// Verdict at the given significance level.
    pub fn outcome(&self, alpha: f64) -> TestOutcome {
        TestOutcome::from_p_value(self.p_value, alpha)
    }

    pub fn summary(&self, alpha: f64) -> String {
        match self.outcome(alpha) {
            TestOutcome::Fail => format!("{}; H0 is rejected at alpha={}", self, alpha),
            TestOutcome::Pass => format!("{}; H0 fails to be rejected at alpha={}", self, alpha),
        }
    }
}

impl fmt::Display for ElbeTTestOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t_stat={:.3}, observed.mean={:.3}, ELBE.mean={:.3}, N={}, s2={:.3}, p={:.5}",
            self.t_stat, self.observed_mean, self.elbe_mean, self.n, self.error_variance, self.p_value
        )
    }
}

/// t-test of the null hypothesis that ELBE equals realised LGD.
pub fn elbe_t_test(
    data: &Dataset,
    lgd_col: &str,
    elbe_col: &str,
) -> RiskValidationResult<ElbeTTestOutput> {
    if data.is_empty() {
        return Err(RiskValidationError::EmptyDataset);
    }
    let observed = data.numeric(lgd_col)?;
    let elbe = data.numeric(elbe_col)?;

    let n = observed.len();
    if n < 2 {
        return Err(RiskValidationError::InsufficientData(
            "at least 2 observations are required for a t-test".to_string(),
        ));
    }
    let n_f = n as f64;

    let errors: Vec<f64> = observed
        .iter()
        .zip(elbe.iter())
        .map(|(o, e)| o - e)
        .collect();
    let mean_error = errors.iter().sum::<f64>() / n_f;
    let error_variance = errors
        .iter()
        .map(|e| (e - mean_error) * (e - mean_error))
        .sum::<f64>()
        / (n_f - 1.0);
    if error_variance == 0.0 {
        return Err(RiskValidationError::DivisionByZero {
            context: "ELBE t-statistic (zero error variance)".to_string(),
        });
    }

    let t_stat = n_f.sqrt() * mean_error / error_variance.sqrt();
    let reference =
        StudentsT::new(0.0, 1.0, n_f - 1.0).map_err(|_| RiskValidationError::Numeric {
            context: "Student-t reference distribution".to_string(),
        })?;
    let p_value = 2.0 * (1.0 - reference.cdf(t_stat.abs()));

    Ok(ElbeTTestOutput {
        n: n as u64,
        observed_mean: observed.iter().sum::<f64>() / n_f,
        elbe_mean: elbe.iter().sum::<f64>() / n_f,
        t_stat,
        error_variance,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_symmetric_errors_fail_to_reject() {
        let mut data = Dataset::new();
        data.insert_numeric("lgd", num(&[0.3, 0.5])).unwrap();
        data.insert_numeric("elbe", num(&[0.4, 0.4])).unwrap();
        let out = elbe_t_test(&data, "lgd", "elbe").unwrap();
        assert!(approx_eq(out.t_stat, 0.0, 1e-12));
        assert!(approx_eq(out.p_value, 1.0, 1e-9));
        assert!(approx_eq(out.error_variance, 0.02, 1e-12));
        assert_eq!(out.outcome(0.05), TestOutcome::Pass);
    }

    #[test]
    fn test_two_sided_doubles_the_tail() {
        let mut data = Dataset::new();
        data.insert_numeric("lgd", num(&[0.2, 0.4, 0.6, 0.8])).unwrap();
        data.insert_numeric("elbe", num(&[0.1, 0.2, 0.3, 0.4])).unwrap();
        let out = elbe_t_test(&data, "lgd", "elbe").unwrap();
        // Same pairs as the one-sided LGD test; p doubles.
        assert!(approx_eq(out.t_stat, 3.872_983_346_207_417, 1e-9));
        assert!(approx_eq(out.p_value, 2.0 * 0.015_26, 2e-4), "p={}", out.p_value);
    }

    #[test]
    fn test_sign_symmetry() {
        let mut data = Dataset::new();
        data.insert_numeric("lgd", num(&[0.1, 0.2, 0.3, 0.4])).unwrap();
        data.insert_numeric("elbe", num(&[0.2, 0.4, 0.6, 0.8])).unwrap();
        let flipped = elbe_t_test(&data, "lgd", "elbe").unwrap();
        let mut data2 = Dataset::new();
        data2.insert_numeric("lgd", num(&[0.2, 0.4, 0.6, 0.8])).unwrap();
        data2.insert_numeric("elbe", num(&[0.1, 0.2, 0.3, 0.4])).unwrap();
        let baseline = elbe_t_test(&data2, "lgd", "elbe").unwrap();
        assert!(approx_eq(flipped.t_stat, -baseline.t_stat, 1e-12));
        assert!(approx_eq(flipped.p_value, baseline.p_value, 1e-12));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(matches!(
            elbe_t_test(&Dataset::new(), "lgd", "elbe"),
            Err(RiskValidationError::EmptyDataset)
        ));
    }

    #[test]
    fn test_wrong_column_kind_rejected() {
        let mut data = Dataset::new();
        data.insert_categorical("lgd", vec![Some("x".to_string()), Some("y".to_string())])
            .unwrap();
        data.insert_numeric("elbe", num(&[0.1, 0.2])).unwrap();
        assert!(matches!(
            elbe_t_test(&data, "lgd", "elbe"),
            Err(RiskValidationError::ColumnType { .. })
        ));
    }

    #[test]
    fn test_zero_variance_rejected() {
        let mut data = Dataset::new();
        data.insert_numeric("lgd", num(&[0.5, 0.5])).unwrap();
        data.insert_numeric("elbe", num(&[0.5, 0.5])).unwrap();
        assert!(matches!(
            elbe_t_test(&data, "lgd", "elbe"),
            Err(RiskValidationError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_display_mentions_statistic() {
        let mut data = Dataset::new();
        data.insert_numeric("lgd", num(&[0.3, 0.5])).unwrap();
        data.insert_numeric("elbe", num(&[0.4, 0.4])).unwrap();
        let out = elbe_t_test(&data, "lgd", "elbe").unwrap();
        let line = out.to_string();
        assert!(line.contains("t_stat="));
        assert!(line.contains("N=2"));
        assert!(out.summary(0.05).contains("fails to be rejected"));
    }
}
