use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-valued verdict of a validation test.
///
/// `Pass` means the rating model survives the test: the null hypothesis is
/// not rejected, or the one-sided bound is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Pass,
    Fail,
}

impl TestOutcome {
    /// Verdict from comparing a p-value against a significance level.
    pub fn from_p_value(p_value: f64, alpha: f64) -> Self {
        if p_value <= alpha {
            TestOutcome::Fail
        } else {
            TestOutcome::Pass
        }
    }

    pub fn is_pass(self) -> bool {
        matches!(self, TestOutcome::Pass)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Pass => write!(f, "Pass"),
            TestOutcome::Fail => write!(f, "Fail"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_at_or_below_alpha() {
        assert_eq!(TestOutcome::from_p_value(0.05, 0.05), TestOutcome::Fail);
        assert_eq!(TestOutcome::from_p_value(0.01, 0.05), TestOutcome::Fail);
    }

    #[test]
    fn test_pass_above_alpha() {
        assert_eq!(TestOutcome::from_p_value(0.06, 0.05), TestOutcome::Pass);
        assert!(TestOutcome::from_p_value(0.9, 0.05).is_pass());
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(TestOutcome::Pass.to_string(), "Pass");
        assert_eq!(TestOutcome::Fail.to_string(), "Fail");
    }
}
