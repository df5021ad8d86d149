//! Per-trial analyzer output

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TrialError;

/// Structured output shared by every analyzer.
///
/// Fields an analyzer does not produce stay `None`; the aggregator skips the
/// metrics that depend on them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub estimate: Option<f64>,
    pub std_error: Option<f64>,
    /// Test statistic (t, F, ...)
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    /// Non-fatal diagnostic raised while producing the estimate
    pub warning: Option<String>,
}

impl Estimate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn point(mut self, estimate: f64) -> Self {
        self.estimate = Some(estimate);
        self
    }

    #[must_use]
    pub fn std_error(mut self, std_error: f64) -> Self {
        self.std_error = Some(std_error);
        self
    }

    #[must_use]
    pub fn statistic(mut self, statistic: f64) -> Self {
        self.statistic = Some(statistic);
        self
    }

    #[must_use]
    pub fn p_value(mut self, p_value: f64) -> Self {
        self.p_value = Some(p_value);
        self
    }

    #[must_use]
    pub fn interval(mut self, lower: f64, upper: f64) -> Self {
        self.ci_lower = Some(lower);
        self.ci_upper = Some(upper);
        self
    }

    #[must_use]
    pub fn warning(mut self, message: impl Into<String>) -> Self {
        self.warning = Some(message.into());
        self
    }

    /// Whether the reported interval contains `value`, endpoints included.
    /// `None` when the analyzer reported no interval.
    #[must_use]
    pub fn covers(&self, value: f64) -> Option<bool> {
        match (self.ci_lower, self.ci_upper) {
            (Some(lo), Some(hi)) => Some(lo <= value && value <= hi),
            _ => None,
        }
    }

    #[must_use]
    pub fn interval_width(&self) -> Option<f64> {
        match (self.ci_lower, self.ci_upper) {
            (Some(lo), Some(hi)) => Some(hi - lo),
            _ => None,
        }
    }

    /// Whether the test rejects at level `alpha` (strictly below).
    #[must_use]
    pub fn rejects(&self, alpha: f64) -> Option<bool> {
        self.p_value.map(|p| p < alpha)
    }
}

/// Result-or-failure of one analyzer on one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialOutcome {
    Success(Estimate),
    Failed(TrialError),
}

impl TrialOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, TrialOutcome::Success(_))
    }

    #[must_use]
    pub fn estimate(&self) -> Option<&Estimate> {
        match self {
            TrialOutcome::Success(estimate) => Some(estimate),
            TrialOutcome::Failed(_) => None,
        }
    }
}

impl From<Result<Estimate, TrialError>> for TrialOutcome {
    fn from(result: Result<Estimate, TrialError>) -> Self {
        match result {
            Ok(estimate) => TrialOutcome::Success(estimate),
            Err(err) => TrialOutcome::Failed(err),
        }
    }
}

/// One row of the result collection: an analyzer's outcome on one trial,
/// tagged with its scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub scenario: usize,
    pub trial: usize,
    pub analyzer: Arc<str>,
    pub outcome: TrialOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_is_inclusive_at_endpoints() {
        let est = Estimate::new().point(1.0).interval(0.5, 1.5);
        assert_eq!(est.covers(0.5), Some(true));
        assert_eq!(est.covers(1.5), Some(true));
        assert_eq!(est.covers(1.5000001), Some(false));
        assert_eq!(Estimate::new().point(1.0).covers(1.0), None);
    }

    #[test]
    fn test_rejection_is_strict() {
        let est = Estimate::new().p_value(0.05);
        assert_eq!(est.rejects(0.05), Some(false));
        assert_eq!(est.rejects(0.051), Some(true));
    }
}
