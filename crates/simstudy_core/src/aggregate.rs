//! Reduce a result collection to performance metrics.
//!
//! Every proportion (coverage, rejection, failure and warning rates) comes
//! with a binomial interval; every mean-type metric (bias, RMSE) with a
//! normal-approximation interval built from its Monte Carlo standard error.
//! All intervals are at `uncertainty_level`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;
use crate::model::{
    Estimate, GroundTruth, MetricEstimate, PerformanceSummary, ResultCollection, TrialResult,
};
use crate::stats;

/// Interval method for proportion metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProportionInterval {
    #[default]
    Wilson,
    /// Exact binomial interval from Beta quantiles
    ClopperPearson,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Nominal level for rejection rates; a test rejects when `p < alpha`
    pub alpha: f64,
    /// Confidence level of the Monte Carlo uncertainty intervals
    pub uncertainty_level: f64,
    pub interval: ProportionInterval,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            uncertainty_level: 0.95,
            interval: ProportionInterval::Wilson,
        }
    }
}

impl AggregateConfig {
    pub fn validate(&self) -> Result<(), AggregateError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AggregateError::Setting(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.uncertainty_level > 0.0 && self.uncertainty_level < 1.0) {
            return Err(AggregateError::Setting(format!(
                "uncertainty_level must be in (0, 1), got {}",
                self.uncertainty_level
            )));
        }
        Ok(())
    }

    fn z(&self) -> Result<f64, AggregateError> {
        stats::normal_quantile(1.0 - (1.0 - self.uncertainty_level) / 2.0).ok_or_else(|| {
            AggregateError::Setting(format!(
                "no normal quantile for level {}",
                self.uncertainty_level
            ))
        })
    }

    fn proportion(&self, hits: usize, trials: usize) -> Option<MetricEstimate> {
        if trials == 0 {
            return None;
        }
        let (lower, upper) = match self.interval {
            ProportionInterval::Wilson => {
                stats::wilson_interval(hits, trials, self.uncertainty_level)?
            }
            ProportionInterval::ClopperPearson => {
                stats::clopper_pearson_interval(hits, trials, self.uncertainty_level)?
            }
        };
        let n = trials as f64;
        let p = hits as f64 / n;
        Some(MetricEstimate {
            value: p,
            mcse: (p * (1.0 - p) / n).sqrt(),
            lower,
            upper,
            trials,
        })
    }
}

/// Metric with a normal-approximation interval `value ± z * mcse`
fn normal_metric(value: f64, mcse: f64, z: f64, trials: usize) -> MetricEstimate {
    MetricEstimate {
        value,
        mcse,
        lower: value - z * mcse,
        upper: value + z * mcse,
        trials,
    }
}

/// Check the collection invariants shared by every summary.
fn check_complete(collection: &ResultCollection) -> Result<(), AggregateError> {
    if collection.is_empty() {
        return Err(AggregateError::EmptyCollection {
            scenario: collection.scenario,
        });
    }
    let kept = collection.kept();
    for (name, rows) in collection.analyzers().iter().zip(collection.row_counts()) {
        if rows != kept {
            return Err(AggregateError::Incomplete {
                scenario: collection.scenario,
                analyzer: name.to_string(),
                attempted: collection.attempted(),
                kept,
                dropped: collection.dropped(),
                rows,
            });
        }
    }
    Ok(())
}

/// Summarize every analyzer of a collection, in study order.
pub fn summarize(
    collection: &ResultCollection,
    truth: &GroundTruth,
    config: &AggregateConfig,
) -> Result<Vec<PerformanceSummary>, AggregateError> {
    config.validate()?;
    check_complete(collection)?;

    let mut by_analyzer: FxHashMap<&str, Vec<&TrialResult>> = FxHashMap::default();
    for row in collection.rows() {
        by_analyzer.entry(row.analyzer.as_ref()).or_default().push(row);
    }

    collection
        .analyzers()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let rows = by_analyzer.remove(name.as_ref()).unwrap_or_default();
            summarize_rows(collection, idx, name, &rows, truth, config)
        })
        .collect()
}

/// Summarize a single analyzer of a collection.
pub fn summarize_analyzer(
    collection: &ResultCollection,
    analyzer: &str,
    truth: &GroundTruth,
    config: &AggregateConfig,
) -> Result<PerformanceSummary, AggregateError> {
    config.validate()?;
    let idx = collection
        .analyzer_index(analyzer)
        .ok_or_else(|| AggregateError::UnknownAnalyzer(analyzer.to_string()))?;
    check_complete(collection)?;

    let rows: Vec<&TrialResult> = collection.rows_for(analyzer).collect();
    summarize_rows(collection, idx, analyzer, &rows, truth, config)
}

fn summarize_rows(
    collection: &ResultCollection,
    analyzer_index: usize,
    analyzer: &str,
    rows: &[&TrialResult],
    truth: &GroundTruth,
    config: &AggregateConfig,
) -> Result<PerformanceSummary, AggregateError> {
    let z = config.z()?;
    let attempted = collection.attempted();
    let estimates: Vec<&Estimate> = rows.iter().filter_map(|r| r.outcome.estimate()).collect();
    let successful = estimates.len();

    let failure_rate = config
        .proportion(collection.failures(analyzer_index), attempted)
        .ok_or(AggregateError::EmptyCollection {
            scenario: collection.scenario,
        })?;

    let warnings = estimates.iter().filter(|e| e.warning.is_some()).count();
    let warning_rate = config.proportion(warnings, successful);

    let coverage = truth.value.and_then(|value| {
        let covered: Vec<bool> = estimates.iter().filter_map(|e| e.covers(value)).collect();
        let hits = covered.iter().filter(|&&c| c).count();
        config.proportion(hits, covered.len())
    });

    let rejections: Vec<bool> = estimates
        .iter()
        .filter_map(|e| e.rejects(config.alpha))
        .collect();
    let rejection_rate = config.proportion(
        rejections.iter().filter(|&&r| r).count(),
        rejections.len(),
    );

    let points: Vec<f64> = estimates.iter().filter_map(|e| e.estimate).collect();
    let mean_estimate = stats::mean(&points);
    let empirical_se = stats::std_dev(&points);

    let (bias, rmse) = match (truth.value, empirical_se) {
        (Some(value), Some(sd)) => {
            let n = points.len();
            let bias = normal_metric(
                mean_estimate.unwrap_or(value) - value,
                sd / (n as f64).sqrt(),
                z,
                n,
            );
            (Some(bias), rmse_metric(&points, value, z))
        }
        _ => (None, None),
    };

    let std_errors: Vec<f64> = estimates.iter().filter_map(|e| e.std_error).collect();
    let widths: Vec<f64> = estimates.iter().filter_map(|e| e.interval_width()).collect();

    Ok(PerformanceSummary {
        scenario: collection.scenario,
        params: collection.params.clone(),
        analyzer: analyzer.to_string(),
        attempted,
        successful,
        failure_rate,
        warning_rate,
        coverage,
        rejection_rate,
        bias,
        rmse,
        mean_estimate,
        empirical_se,
        mean_std_error: stats::mean(&std_errors),
        mean_interval_width: stats::mean(&widths),
    })
}

/// RMSE with a delta-method MCSE: `se(MSE) / (2 * RMSE)`.
fn rmse_metric(points: &[f64], truth: f64, z: f64) -> Option<MetricEstimate> {
    let squared: Vec<f64> = points.iter().map(|x| (x - truth).powi(2)).collect();
    let mse = stats::mean(&squared)?;
    let rmse = mse.sqrt();
    let mse_se = stats::std_dev(&squared)? / (squared.len() as f64).sqrt();
    let mcse = if rmse > 0.0 { mse_se / (2.0 * rmse) } else { 0.0 };
    let mut metric = normal_metric(rmse, mcse, z, points.len());
    metric.lower = metric.lower.max(0.0);
    Some(metric)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::TrialError;
    use crate::model::TrialOutcome;

    fn ok(estimate: f64, lo: f64, hi: f64, p: f64) -> TrialOutcome {
        TrialOutcome::Success(
            Estimate::new()
                .point(estimate)
                .std_error(0.5)
                .interval(lo, hi)
                .p_value(p),
        )
    }

    fn single(outcomes: Vec<TrialOutcome>) -> ResultCollection {
        let mut col = ResultCollection::new(0, vec![Arc::from("a")]);
        for (trial, outcome) in outcomes.into_iter().enumerate() {
            col.record_trial(trial, vec![outcome]);
        }
        col
    }

    #[test]
    fn test_empty_collection_is_an_error() {
        let col = ResultCollection::new(4, vec![Arc::from("a")]);
        let err = summarize(&col, &GroundTruth::value(0.0), &AggregateConfig::default()).unwrap_err();
        assert_eq!(err, AggregateError::EmptyCollection { scenario: 4 });
    }

    #[test]
    fn test_incomplete_collection_is_an_error() {
        let mut col = ResultCollection::new(0, vec![Arc::from("a"), Arc::from("b")]);
        col.record_trial(0, vec![ok(1.0, 0.0, 2.0, 0.5), ok(1.0, 0.0, 2.0, 0.5)]);
        // A collection deserialized with a row missing
        let mut value = serde_json::to_value(&col).unwrap();
        value["rows"].as_array_mut().unwrap().pop();
        let broken: ResultCollection = serde_json::from_value(value).unwrap();

        let err = summarize(&broken, &GroundTruth::value(1.0), &AggregateConfig::default())
            .unwrap_err();
        assert!(matches!(err, AggregateError::Incomplete { rows: 0, .. }));
    }

    #[test]
    fn test_coverage_counts_endpoints_and_rejection_is_strict() {
        let col = single(vec![
            ok(1.0, 0.0, 2.0, 0.01),
            ok(1.0, 1.0, 3.0, 0.05),  // truth on the lower endpoint
            ok(3.0, 2.5, 3.5, 0.049), // misses
            ok(1.0, -1.0, 1.0, 0.5),  // truth on the upper endpoint
        ]);
        let s = summarize_analyzer(&col, "a", &GroundTruth::value(1.0), &AggregateConfig::default())
            .unwrap();

        assert_eq!(s.coverage.unwrap().value, 0.75);
        assert_eq!(s.rejection_rate.unwrap().value, 0.5);
        assert_eq!(s.failure_rate.value, 0.0);
        assert_eq!(s.successful, 4);
        assert_eq!(s.mean_estimate, Some(1.5));
        assert!((s.bias.unwrap().value - 0.5).abs() < 1e-12);
        assert_eq!(s.mean_std_error, Some(0.5));
        assert_eq!(s.mean_interval_width, Some(1.75));
    }

    #[test]
    fn test_rmse_by_hand() {
        let col = single(vec![ok(1.0, 0.0, 2.0, 0.5), ok(3.0, 2.0, 4.0, 0.5)]);
        let s = summarize(&col, &GroundTruth::value(1.0), &AggregateConfig::default()).unwrap();
        // Errors 0 and 2: MSE 2
        let rmse = s[0].rmse.unwrap();
        assert!((rmse.value - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(rmse.lower >= 0.0);
    }

    #[test]
    fn test_flagged_failures_counted_but_excluded() {
        let col = single(vec![
            ok(1.0, 0.0, 2.0, 0.5),
            TrialOutcome::Failed(TrialError::degenerate("a", "zero variance")),
            ok(2.0, 1.5, 2.5, 0.5),
            TrialOutcome::Failed(TrialError::degenerate("a", "zero variance")),
        ]);
        let s = summarize(&col, &GroundTruth::value(1.0), &AggregateConfig::default()).unwrap();

        assert_eq!(s[0].attempted, 4);
        assert_eq!(s[0].successful, 2);
        assert_eq!(s[0].failure_rate.value, 0.5);
        assert_eq!(s[0].coverage.unwrap().trials, 2);
        assert_eq!(s[0].coverage.unwrap().value, 0.5);
    }

    #[test]
    fn test_all_failed_reports_failure_rate_only() {
        let mut col = ResultCollection::new(0, vec![Arc::from("a")]);
        for _ in 0..3 {
            col.record_dropped(&[0]);
        }
        let s = summarize(&col, &GroundTruth::value(1.0), &AggregateConfig::default()).unwrap();

        assert_eq!(s[0].failure_rate.value, 1.0);
        assert!(s[0].coverage.is_none());
        assert!(s[0].bias.is_none());
        assert!(s[0].rmse.is_none());
        assert!(s[0].mean_estimate.is_none());
        assert!(s[0].warning_rate.is_none());
    }

    #[test]
    fn test_interval_methods_contain_estimate() {
        let outcomes = (0..40)
            .map(|i| {
                let hi = if i % 4 == 0 { 0.5 } else { 2.0 };
                ok(1.0, 0.0, hi, 0.5)
            })
            .collect();
        let col = single(outcomes);
        let truth = GroundTruth::value(1.0);

        for interval in [ProportionInterval::Wilson, ProportionInterval::ClopperPearson] {
            let config = AggregateConfig {
                interval,
                ..Default::default()
            };
            let coverage = summarize(&col, &truth, &config).unwrap()[0].coverage.unwrap();
            assert_eq!(coverage.value, 0.75);
            assert!(coverage.contains(0.75));
            assert!(coverage.lower > 0.5 && coverage.upper < 0.9);
        }
    }

    #[test]
    fn test_unknown_analyzer_and_bad_settings() {
        let col = single(vec![ok(1.0, 0.0, 2.0, 0.5)]);
        let truth = GroundTruth::value(1.0);
        assert_eq!(
            summarize_analyzer(&col, "zzz", &truth, &AggregateConfig::default()).unwrap_err(),
            AggregateError::UnknownAnalyzer("zzz".to_string())
        );

        let config = AggregateConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            summarize(&col, &truth, &config),
            Err(AggregateError::Setting(_))
        ));
    }

    #[test]
    fn test_no_truth_skips_truth_metrics() {
        let col = single(vec![ok(1.0, 0.0, 2.0, 0.01), ok(1.2, 0.0, 2.0, 0.2)]);
        let s = summarize(&col, &GroundTruth::default(), &AggregateConfig::default()).unwrap();
        assert!(s[0].coverage.is_none());
        assert!(s[0].bias.is_none());
        assert_eq!(s[0].rejection_rate.unwrap().value, 0.5);
    }
}
