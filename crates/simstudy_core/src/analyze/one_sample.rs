//! One-sample t procedures

use super::{Analyzer, check_confidence};
use crate::error::{ConfigError, FailureKind, TrialError};
use crate::model::{Dataset, Estimate};
use crate::params::ScenarioParams;
use crate::stats;

/// One-sample t interval and two-sided t test for the mean.
///
/// The null value is `null` when set, otherwise the scenario's `mu0`
/// parameter, otherwise 0.
#[derive(Debug, Clone)]
pub struct OneSampleT {
    name: String,
    confidence: f64,
    null: Option<f64>,
}

impl OneSampleT {
    #[must_use]
    pub fn new(confidence: f64) -> Self {
        Self {
            name: "one_sample_t".to_string(),
            confidence,
            null: None,
        }
    }

    #[must_use]
    pub fn with_null(mut self, null: f64) -> Self {
        self.null = Some(null);
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn null_value(&self, params: &ScenarioParams) -> Result<f64, TrialError> {
        match self.null {
            Some(null) => Ok(null),
            None => params
                .f64_or("mu0", 0.0)
                .map_err(|e| TrialError::new(&self.name, FailureKind::Other, e.to_string())),
        }
    }
}

impl Analyzer for OneSampleT {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_confidence(self.confidence)
    }

    fn analyze(&self, data: &Dataset, params: &ScenarioParams) -> Result<Estimate, TrialError> {
        let values: Vec<f64> = data.values().collect();
        let n = values.len();
        if n < 2 {
            return Err(TrialError::degenerate(
                &self.name,
                format!("need at least 2 observations, found {n}"),
            ));
        }

        let mean = stats::mean(&values)
            .ok_or_else(|| TrialError::numerical(&self.name, "mean undefined"))?;
        let sd = stats::std_dev(&values)
            .ok_or_else(|| TrialError::numerical(&self.name, "standard deviation undefined"))?;
        if sd == 0.0 {
            return Err(TrialError::degenerate(&self.name, "sample has zero variance"));
        }

        let df = (n - 1) as f64;
        let se = sd / (n as f64).sqrt();
        let q = stats::t_quantile(1.0 - (1.0 - self.confidence) / 2.0, df)
            .ok_or_else(|| TrialError::numerical(&self.name, "t quantile undefined"))?;

        let t = (mean - self.null_value(params)?) / se;
        let p = stats::t_two_sided_p(t, df)
            .ok_or_else(|| TrialError::numerical(&self.name, "p-value undefined"))?;

        Ok(Estimate::new()
            .point(mean)
            .std_error(se)
            .statistic(t)
            .p_value(p)
            .interval(mean - q * se, mean + q * se))
    }
}
