//! Performance summaries produced by the aggregator

use serde::{Deserialize, Serialize};

use crate::params::ScenarioParams;

/// A Monte Carlo estimate of a performance metric together with its own
/// sampling uncertainty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricEstimate {
    pub value: f64,
    /// Monte Carlo standard error
    pub mcse: f64,
    pub lower: f64,
    pub upper: f64,
    /// Number of trials the metric was computed from
    pub trials: usize,
}

impl MetricEstimate {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Performance metrics of one analyzer in one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub scenario: usize,
    pub params: ScenarioParams,
    pub analyzer: String,

    /// Trials started for this scenario, including dropped ones
    pub attempted: usize,
    /// Trials with a successful estimate from this analyzer
    pub successful: usize,

    /// Share of attempted trials in which this analyzer failed
    pub failure_rate: MetricEstimate,
    /// Share of successful trials that carried a warning
    pub warning_rate: Option<MetricEstimate>,

    /// Share of intervals containing the true value
    pub coverage: Option<MetricEstimate>,
    /// Share of p-values below `alpha`
    pub rejection_rate: Option<MetricEstimate>,
    pub bias: Option<MetricEstimate>,
    pub rmse: Option<MetricEstimate>,

    pub mean_estimate: Option<f64>,
    /// Standard deviation of the point estimates across trials
    pub empirical_se: Option<f64>,
    /// Average of the standard errors the analyzer reported
    pub mean_std_error: Option<f64>,
    pub mean_interval_width: Option<f64>,
}
