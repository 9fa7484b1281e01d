//! Hosmer-Lemeshow chi-square test of PD calibration on pre-binned buckets.
//!
//! Measures the squared difference between forecasted and observed defaults
//! at bucket level. Under the null hypothesis that forecast PDs and observed
//! default rates agree, the statistic converges to a chi-square distribution
//! with B - 2 degrees of freedom as the portfolio grows (Blochwitz, Martin
//! and Wehn, 2006). Each bucket must carry a single forecast PD; a bucket
//! mixing distinct PDs is rejected outright.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::fmt;

use crate::dataset::Dataset;
use crate::error::RiskValidationError;
use crate::tabulate::group_rows;
use crate::types::TestOutcome;
use crate::RiskValidationResult;

/// Observed and forecast figures for one bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketCalibration {
    pub bucket: String,
    /// Observations in the bucket.
    pub n: u64,
    /// Observed defaults in the bucket.
    pub defaults: u64,
    /// The bucket's single forecast PD.
    pub pd: f64,
}

/// Result of the Hosmer-Lemeshow test. The verdict is available through
/// [`HosmerLemeshowOutput::outcome`] and the summary text only; it is not a
/// stored field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HosmerLemeshowOutput {
    /// Per-bucket breakdown in sorted bucket order.
    pub buckets: Vec<BucketCalibration>,
    /// Chi-square statistic over the buckets.
    pub statistic: f64,
    /// Number of buckets minus 2.
    pub degrees_of_freedom: u32,
    /// Chi-square quantile at 1 - alpha.
    pub critical_value: f64,
    /// Upper-tail p-value of the statistic.
    pub p_value: f64,
    pub alpha: f64,
}

impl HosmerLemeshowOutput {
    /// Verdict at the configured significance level.
    pub fn outcome(&self) -> TestOutcome {
        TestOutcome::from_p_value(self.p_value, self.alpha)
    }

    /// Operator-facing summary with the accept/reject sentence.
    pub fn summary(&self) -> String {
        let verdict = match self.outcome() {
            TestOutcome::Fail => {
                "the hypothesis that observed defaults equal predicted defaults is rejected"
            }
            TestOutcome::Pass => {
                "the hypothesis that observed defaults equal predicted defaults fails to be rejected"
            }
        };
        format!("{}; {}", self, verdict)
    }
}

impl fmt::Display for HosmerLemeshowOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "statistic={:.3}, df={}, cv={:.3}, p={:.3}",
            self.statistic, self.degrees_of_freedom, self.critical_value, self.p_value
        )
    }
}

/// Hosmer-Lemeshow chi-square test over pre-binned PD buckets.
pub fn hosmer_lemeshow_test(
    data: &Dataset,
    buckets_col: &str,
    defaults_col: &str,
    pd_col: &str,
    alpha: f64,
) -> RiskValidationResult<HosmerLemeshowOutput> {
    if data.is_empty() {
        return Err(RiskValidationError::EmptyDataset);
    }
    check_alpha(alpha)?;
    let buckets = data.categorical(buckets_col)?;
    let flags = data.numeric(defaults_col)?;
    let pds = data.numeric(pd_col)?;
    check_probabilities(&pds, pd_col)?;
    check_flags(&flags, defaults_col)?;

    let groups = group_rows(&buckets);
    if groups.len() < 3 {
        return Err(RiskValidationError::InsufficientData(format!(
            "at least 3 buckets are required for positive degrees of freedom, found {}",
            groups.len()
        )));
    }

    let mut breakdown = Vec::with_capacity(groups.len());
    let mut statistic = 0.0;
    for (bucket, indices) in &groups {
        let pd = pds[indices[0]];
        if indices.iter().any(|&i| pds[i] != pd) {
            return Err(RiskValidationError::InconsistentBucket {
                bucket: bucket.to_string(),
            });
        }
        let n = indices.len() as f64;
        let defaults: f64 = indices.iter().map(|&i| flags[i]).sum();

        let denominator = n * pd * (1.0 - pd);
        if denominator == 0.0 {
            return Err(RiskValidationError::DivisionByZero {
                context: format!("Hosmer-Lemeshow term for bucket '{}' with PD {}", bucket, pd),
            });
        }
        let deviation = n * pd - defaults;
        statistic += deviation * deviation / denominator;

        breakdown.push(BucketCalibration {
            bucket: bucket.to_string(),
            n: indices.len() as u64,
            defaults: defaults as u64,
            pd,
        });
    }

    let degrees_of_freedom = (groups.len() - 2) as u32;
    let reference =
        ChiSquared::new(degrees_of_freedom as f64).map_err(|_| RiskValidationError::Numeric {
            context: "chi-square reference distribution".to_string(),
        })?;
    let critical_value = reference.inverse_cdf(1.0 - alpha);
    let p_value = 1.0 - reference.cdf(statistic);

    Ok(HosmerLemeshowOutput {
        buckets: breakdown,
        statistic,
        degrees_of_freedom,
        critical_value,
        p_value,
        alpha,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    /// Three buckets whose observed defaults match the forecast exactly:
    /// 10 loans at PD 0.2 with 2 defaults, 10 at 0.5 with 5, 10 at 0.8 with 8.
    fn calibrated_portfolio() -> Dataset {
        let mut buckets = Vec::new();
        let mut pds = Vec::new();
        let mut flags = Vec::new();
        for (bucket, pd, defaults) in [("low", 0.2, 2), ("mid", 0.5, 5), ("high", 0.8, 8)] {
            for i in 0..10 {
                buckets.push(Some(bucket.to_string()));
                pds.push(Some(pd));
                flags.push(Some(if i < defaults { 1.0 } else { 0.0 }));
            }
        }
        let mut data = Dataset::new();
        data.insert_categorical("bucket", buckets).unwrap();
        data.insert_numeric("pd", pds).unwrap();
        data.insert_numeric("default_flag", flags).unwrap();
        data
    }

    #[test]
    fn test_exact_calibration_zero_statistic() {
        let out =
            hosmer_lemeshow_test(&calibrated_portfolio(), "bucket", "default_flag", "pd", 0.05)
                .unwrap();
        assert!(approx_eq(out.statistic, 0.0, 1e-12));
        assert!(approx_eq(out.p_value, 1.0, 1e-12));
        assert_eq!(out.degrees_of_freedom, 1);
        assert!(approx_eq(out.critical_value, 3.841, 1e-2));
        assert_eq!(out.outcome(), TestOutcome::Pass);
    }

    #[test]
    fn test_bucket_breakdown() {
        let out =
            hosmer_lemeshow_test(&calibrated_portfolio(), "bucket", "default_flag", "pd", 0.05)
                .unwrap();
        assert_eq!(out.buckets.len(), 3);
        // Sorted bucket order.
        let labels: Vec<&str> = out.buckets.iter().map(|b| b.bucket.as_str()).collect();
        assert_eq!(labels, vec!["high", "low", "mid"]);
        let low = out.buckets.iter().find(|b| b.bucket == "low").unwrap();
        assert_eq!(low.n, 10);
        assert_eq!(low.defaults, 2);
        assert_eq!(low.pd, 0.2);
    }

    #[test]
    fn test_miscalibrated_bucket_raises_statistic() {
        let mut data = calibrated_portfolio();
        // Rewrite the low bucket's flags so 8 of 10 default against PD 0.2.
        let mut flags = Vec::new();
        for defaults in [8, 5, 8] {
            for i in 0..10 {
                flags.push(Some(if i < defaults { 1.0 } else { 0.0 }));
            }
        }
        data.insert_numeric("default_flag", flags).unwrap();
        let out = hosmer_lemeshow_test(&data, "bucket", "default_flag", "pd", 0.05).unwrap();
        // Single contribution: (10*0.2 - 8)^2 / (10*0.2*0.8) = 22.5
        assert!(approx_eq(out.statistic, 22.5, 1e-9));
        assert!(out.p_value < 0.001);
        assert_eq!(out.outcome(), TestOutcome::Fail);
    }

    #[test]
    fn test_fewer_than_three_buckets_rejected() {
        let mut data = Dataset::new();
        data.insert_categorical(
            "bucket",
            vec![Some("a".to_string()), Some("b".to_string())],
        )
        .unwrap();
        data.insert_numeric("pd", vec![Some(0.2), Some(0.5)]).unwrap();
        data.insert_numeric("default_flag", vec![Some(0.0), Some(1.0)])
            .unwrap();
        assert!(matches!(
            hosmer_lemeshow_test(&data, "bucket", "default_flag", "pd", 0.05),
            Err(RiskValidationError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_mixed_pd_bucket_rejected() {
        let mut data = calibrated_portfolio();
        let mut pds = vec![Some(0.2); 10];
        pds[3] = Some(0.25);
        pds.extend(vec![Some(0.5); 10]);
        pds.extend(vec![Some(0.8); 10]);
        data.insert_numeric("pd", pds).unwrap();
        assert!(matches!(
            hosmer_lemeshow_test(&data, "bucket", "default_flag", "pd", 0.05),
            Err(RiskValidationError::InconsistentBucket { .. })
        ));
    }

    #[test]
    fn test_degenerate_pd_rejected() {
        let mut data = calibrated_portfolio();
        let mut pds = vec![Some(0.0); 10];
        pds.extend(vec![Some(0.5); 10]);
        pds.extend(vec![Some(0.8); 10]);
        data.insert_numeric("pd", pds).unwrap();
        assert!(matches!(
            hosmer_lemeshow_test(&data, "bucket", "default_flag", "pd", 0.05),
            Err(RiskValidationError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_alpha_validated() {
        assert!(matches!(
            hosmer_lemeshow_test(&calibrated_portfolio(), "bucket", "default_flag", "pd", 1.0),
            Err(RiskValidationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_critical_value_tracks_alpha() {
        let strict =
            hosmer_lemeshow_test(&calibrated_portfolio(), "bucket", "default_flag", "pd", 0.01)
                .unwrap();
        let loose =
            hosmer_lemeshow_test(&calibrated_portfolio(), "bucket", "default_flag", "pd", 0.10)
                .unwrap();
        assert!(strict.critical_value > loose.critical_value);
    }

    #[test]
    fn test_summary_sentence() {
        let out =
            hosmer_lemeshow_test(&calibrated_portfolio(), "bucket", "default_flag", "pd", 0.05)
                .unwrap();
        assert!(out.summary().contains("fails to be rejected"));
        assert!(out.to_string().contains("df=1"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let out =
            hosmer_lemeshow_test(&calibrated_portfolio(), "bucket", "default_flag", "pd", 0.05)
                .unwrap();
        let json = serde_json::to_string(&out).unwrap();
        let back: HosmerLemeshowOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.degrees_of_freedom, 1);
        assert_eq!(back.buckets.len(), 3);
    }
}
