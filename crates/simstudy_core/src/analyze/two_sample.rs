//! Two-sample comparisons of `treated - control`.
//!
//! `PooledDiffT` treats every observation as independent; `ClusterMeansT`
//! first collapses each cluster to its mean.

use super::{Analyzer, check_confidence};
use crate::error::{ConfigError, TrialError};
use crate::model::{Dataset, Estimate};
use crate::params::ScenarioParams;
use crate::stats;

/// Welch two-sample t for `treated - control`
fn welch_t(
    name: &str,
    control: &[f64],
    treated: &[f64],
    confidence: f64,
) -> Result<Estimate, TrialError> {
    let (Some(m0), Some(v0)) = (stats::mean(control), stats::variance(control)) else {
        return Err(TrialError::degenerate(
            name,
            format!("control arm has {} units, need at least 2", control.len()),
        ));
    };
    let (Some(m1), Some(v1)) = (stats::mean(treated), stats::variance(treated)) else {
        return Err(TrialError::degenerate(
            name,
            format!("treated arm has {} units, need at least 2", treated.len()),
        ));
    };

    let se = (v0 / control.len() as f64 + v1 / treated.len() as f64).sqrt();
    if se == 0.0 {
        return Err(TrialError::degenerate(name, "both arms have zero variance"));
    }

    let diff = m1 - m0;
    let df = stats::welch_df(v1, treated.len(), v0, control.len());
    let q = stats::t_quantile(1.0 - (1.0 - confidence) / 2.0, df)
        .ok_or_else(|| TrialError::numerical(name, "t quantile undefined"))?;
    let t = diff / se;
    let p = stats::t_two_sided_p(t, df)
        .ok_or_else(|| TrialError::numerical(name, "p-value undefined"))?;

    Ok(Estimate::new()
        .point(diff)
        .std_error(se)
        .statistic(t)
        .p_value(p)
        .interval(diff - q * se, diff + q * se))
}

/// Split `(group, value)` pairs into control (group 0) and treated (group 1).
fn split_arms(
    name: &str,
    units: impl Iterator<Item = (usize, f64)>,
) -> Result<(Vec<f64>, Vec<f64>), TrialError> {
    let mut control = Vec::new();
    let mut treated = Vec::new();
    for (group, value) in units {
        match group {
            0 => control.push(value),
            1 => treated.push(value),
            other => {
                return Err(TrialError::degenerate(
                    name,
                    format!("expected groups 0 and 1, found group {other}"),
                ));
            }
        }
    }
    Ok((control, treated))
}

/// Treatment effect from site means: a Welch t test that treats each site
/// as one unit, respecting the cluster-randomized design.
#[derive(Debug, Clone)]
pub struct ClusterMeansT {
    name: String,
    confidence: f64,
}

impl ClusterMeansT {
    #[must_use]
    pub fn new(confidence: f64) -> Self {
        Self {
            name: "cluster_means_t".to_string(),
            confidence,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Analyzer for ClusterMeansT {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_confidence(self.confidence)
    }

    fn analyze(&self, data: &Dataset, _params: &ScenarioParams) -> Result<Estimate, TrialError> {
        let means = data.cluster_means();
        if means.is_empty() {
            return Err(TrialError::degenerate(&self.name, "dataset has no clusters"));
        }
        let (control, treated) = split_arms(&self.name, means.into_iter())?;
        welch_t(&self.name, &control, &treated, self.confidence)
    }
}

/// Treatment effect from individual observations, ignoring clustering.
///
/// Standard errors are too small when outcomes are correlated within sites;
/// its coverage falls as the intraclass correlation grows.
#[derive(Debug, Clone)]
pub struct PooledDiffT {
    name: String,
    confidence: f64,
}

impl PooledDiffT {
    #[must_use]
    pub fn new(confidence: f64) -> Self {
        Self {
            name: "pooled_diff_t".to_string(),
            confidence,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Analyzer for PooledDiffT {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_confidence(self.confidence)
    }

    fn analyze(&self, data: &Dataset, _params: &ScenarioParams) -> Result<Estimate, TrialError> {
        let units = data.observations().iter().map(|o| (o.group, o.value));
        let (control, treated) = split_arms(&self.name, units)?;
        welch_t(&self.name, &control, &treated, self.confidence)
    }
}
