//! Statistical hypothesis tests for validating credit-risk rating models.
//!
//! Each test is a pure function over an in-memory [`dataset::Dataset`]:
//! it aggregates the referenced columns, computes a classical statistic,
//! and returns the statistic with its degrees of freedom and p-value plus
//! every intermediate quantity, so callers can audit the computation and
//! not just the verdict.

pub mod dataset;
pub mod error;
pub mod lgd_backtesting;
pub mod pd_calibration;
pub mod rating_migration;
pub mod tabulate;
pub mod types;

pub use dataset::{Column, Dataset};
pub use error::RiskValidationError;
pub use types::TestOutcome;

/// Standard result type for all risk-validation operations
pub type RiskValidationResult<T> = Result<T, RiskValidationError>;
