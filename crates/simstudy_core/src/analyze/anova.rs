//! One-way ANOVA: the classic pooled-variance F test and Welch's F.
//!
//! Both report the F statistic and its upper-tail p-value, with the range of
//! group means as the point estimate. The classic test also warns when group
//! variances are far apart.

use super::Analyzer;
use crate::error::TrialError;
use crate::model::{Dataset, Estimate};
use crate::params::ScenarioParams;
use crate::stats;

/// Variance ratio above which the classic F test is flagged as unreliable
const VARIANCE_RATIO_WARNING: f64 = 4.0;

/// Per-group summary shared by both F tests
struct GroupStats {
    n: f64,
    mean: f64,
    var: f64,
}

fn group_stats(name: &str, data: &Dataset) -> Result<Vec<GroupStats>, TrialError> {
    let groups = data.group_values();
    if groups.len() < 2 {
        return Err(TrialError::degenerate(
            name,
            format!("need at least 2 groups, found {}", groups.len()),
        ));
    }

    groups
        .iter()
        .enumerate()
        .map(|(idx, values)| {
            let (Some(mean), Some(var)) = (stats::mean(values), stats::variance(values)) else {
                return Err(TrialError::degenerate(
                    name,
                    format!("group {idx} has {} observations, need at least 2", values.len()),
                ));
            };
            Ok(GroupStats {
                n: values.len() as f64,
                mean,
                var,
            })
        })
        .collect()
}

/// Spread of the group means, the point estimate both F tests report
fn mean_range(groups: &[GroupStats]) -> f64 {
    let max = groups.iter().map(|g| g.mean).fold(f64::NEG_INFINITY, f64::max);
    let min = groups.iter().map(|g| g.mean).fold(f64::INFINITY, f64::min);
    max - min
}

/// Classic one-way ANOVA F test (equal variances assumed).
///
/// Reports the range of the group means as its estimate and warns when the
/// largest group variance exceeds four times the smallest.
#[derive(Debug, Clone)]
pub struct AnovaF {
    name: String,
}

impl AnovaF {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "anova_f".to_string(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for AnovaF {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for AnovaF {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, data: &Dataset, _params: &ScenarioParams) -> Result<Estimate, TrialError> {
        let groups = group_stats(&self.name, data)?;
        let k = groups.len() as f64;
        let total: f64 = groups.iter().map(|g| g.n).sum();
        let grand_mean = groups.iter().map(|g| g.n * g.mean).sum::<f64>() / total;

        let ss_between: f64 = groups
            .iter()
            .map(|g| g.n * (g.mean - grand_mean).powi(2))
            .sum();
        let ss_within: f64 = groups.iter().map(|g| (g.n - 1.0) * g.var).sum();
        if ss_within == 0.0 {
            return Err(TrialError::degenerate(&self.name, "zero within-group variance"));
        }

        let df1 = k - 1.0;
        let df2 = total - k;
        let f = (ss_between / df1) / (ss_within / df2);
        let p = stats::f_upper_p(f, df1, df2)
            .ok_or_else(|| TrialError::numerical(&self.name, "F tail probability undefined"))?;

        let mut estimate = Estimate::new()
            .point(mean_range(&groups))
            .statistic(f)
            .p_value(p);

        let max_var = groups.iter().map(|g| g.var).fold(f64::NEG_INFINITY, f64::max);
        let min_var = groups.iter().map(|g| g.var).fold(f64::INFINITY, f64::min);
        if min_var == 0.0 {
            estimate = estimate.warning("a group has zero variance");
        } else if max_var > VARIANCE_RATIO_WARNING * min_var {
            estimate = estimate.warning(format!(
                "group variances differ by a factor of {:.1}",
                max_var / min_var
            ));
        }
        Ok(estimate)
    }
}

/// Welch's heteroskedastic one-way ANOVA.
///
/// Groups are weighted by `n_j / s_j^2`; the denominator degrees of freedom
/// follow Welch (1951).
#[derive(Debug, Clone)]
pub struct WelchF {
    name: String,
}

impl WelchF {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "welch_f".to_string(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for WelchF {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for WelchF {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, data: &Dataset, _params: &ScenarioParams) -> Result<Estimate, TrialError> {
        let groups = group_stats(&self.name, data)?;
        if let Some(idx) = groups.iter().position(|g| g.var == 0.0) {
            return Err(TrialError::degenerate(
                &self.name,
                format!("group {idx} has zero variance"),
            ));
        }

        let k = groups.len() as f64;
        let weights: Vec<f64> = groups.iter().map(|g| g.n / g.var).collect();
        let weight_sum: f64 = weights.iter().sum();
        let weighted_mean = groups
            .iter()
            .zip(&weights)
            .map(|(g, w)| w * g.mean)
            .sum::<f64>()
            / weight_sum;

        let a = groups
            .iter()
            .zip(&weights)
            .map(|(g, w)| w * (g.mean - weighted_mean).powi(2))
            .sum::<f64>()
            / (k - 1.0);
        let tmp: f64 = groups
            .iter()
            .zip(&weights)
            .map(|(g, w)| (1.0 - w / weight_sum).powi(2) / (g.n - 1.0))
            .sum();
        let b = 1.0 + 2.0 * (k - 2.0) / (k * k - 1.0) * tmp;

        let f = a / b;
        let df1 = k - 1.0;
        let df2 = (k * k - 1.0) / (3.0 * tmp);
        if !df2.is_finite() {
            return Err(TrialError::numerical(&self.name, "denominator degrees of freedom undefined"));
        }
        let p = stats::f_upper_p(f, df1, df2)
            .ok_or_else(|| TrialError::numerical(&self.name, "F tail probability undefined"))?;

        Ok(Estimate::new()
            .point(mean_range(&groups))
            .statistic(f)
            .p_value(p))
    }
}
