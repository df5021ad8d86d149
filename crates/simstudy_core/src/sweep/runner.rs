#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::design::{Design, ScenarioPoint};
use super::progress::SweepProgress;
use crate::aggregate::{AggregateConfig, summarize};
use crate::error::{ConfigError, StudyError};
use crate::model::{GroundTruth, PerformanceSummary};
use crate::repeat::{RepeatConfig, repeat_trials_with_progress};
use crate::study::Study;
use crate::table::StudyTable;

/// Granularity of parallel execution. Trial and scenario parallelism are
/// never nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    /// Everything on the calling thread
    Sequential,
    /// Scenarios one after another, trials of each in parallel
    #[default]
    Trials,
    /// Scenarios in parallel, trials of each sequentially
    Scenarios,
}

fn default_warn_threshold() -> f64 {
    0.10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub repeat: RepeatConfig,
    pub aggregate: AggregateConfig,
    pub parallelism: Parallelism,
    /// Failure rate above which a scenario is logged as a warning
    #[serde(default = "default_warn_threshold")]
    pub failure_warn_threshold: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            repeat: RepeatConfig::default(),
            aggregate: AggregateConfig::default(),
            parallelism: Parallelism::default(),
            failure_warn_threshold: default_warn_threshold(),
        }
    }
}

/// Outcome of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyResults {
    pub table: StudyTable,
    /// Per-analyzer summaries of the completed scenarios, in design order
    pub summaries: Vec<PerformanceSummary>,
    /// Whether the sweep stopped early on request
    pub cancelled: bool,
    pub scenarios_completed: usize,
    pub scenarios_total: usize,
}

/// Run every scenario of `design` and collect the summaries into one table.
///
/// All scenario parameters are validated before the first trial runs. When
/// `progress` is cancelled, scenarios already running finish and no new ones
/// start; the result then holds the completed scenarios with
/// `cancelled = true`.
pub fn run_sweep(
    study: &Study,
    design: &Design,
    config: &SweepConfig,
    progress: Option<&SweepProgress>,
) -> Result<StudyResults, StudyError> {
    config.aggregate.validate()?;
    study.check_policy(config.repeat.policy)?;
    if !(config.failure_warn_threshold >= 0.0 && config.failure_warn_threshold <= 1.0) {
        return Err(ConfigError::invalid(
            "failure_warn_threshold",
            config.failure_warn_threshold,
            "must be in [0, 1]",
        )
        .into());
    }

    let points = design.scenarios()?;
    let truths = points
        .iter()
        .map(|point| study.generator().truth(&point.params))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(p) = progress {
        p.reset(points.len() * config.repeat.trials);
    }

    tracing::info!(
        scenarios = points.len(),
        trials = config.repeat.trials,
        analyzers = study.analyzers().len(),
        generator = study.generator().name(),
        parallelism = ?config.parallelism,
        "starting sweep"
    );

    let outcomes = run_points(study, &points, &truths, config, progress)?;

    let mut table = StudyTable::new(design.factor_names());
    let mut summaries = Vec::new();
    let mut scenarios_completed = 0;
    for (point, outcome) in points.iter().zip(outcomes) {
        if let Some(scenario) = outcome {
            table.push_scenario(&point.levels, &scenario);
            summaries.extend(scenario);
            scenarios_completed += 1;
        }
    }

    let cancelled = scenarios_completed < points.len();
    if cancelled {
        tracing::warn!(
            completed = scenarios_completed,
            total = points.len(),
            "sweep cancelled"
        );
    } else {
        tracing::info!(scenarios = scenarios_completed, rows = table.len(), "sweep complete");
    }

    Ok(StudyResults {
        table,
        summaries,
        cancelled,
        scenarios_completed,
        scenarios_total: points.len(),
    })
}

/// `None` marks a scenario skipped after cancellation.
type PointOutcome = Option<Vec<PerformanceSummary>>;

fn run_point(
    study: &Study,
    point: &ScenarioPoint,
    truth: &GroundTruth,
    config: &SweepConfig,
    repeat: &RepeatConfig,
    progress: Option<&SweepProgress>,
) -> Result<PointOutcome, StudyError> {
    if let Some(p) = progress
        && p.is_cancelled()
    {
        return Ok(None);
    }

    tracing::debug!(scenario = point.index, params = %point.params.label(), "running scenario");

    let collection =
        repeat_trials_with_progress(study, &point.params, point.index, repeat, progress)?;
    let summaries = summarize(&collection, truth, &config.aggregate)?;

    for summary in &summaries {
        if summary.failure_rate.value > config.failure_warn_threshold {
            tracing::warn!(
                scenario = point.index,
                params = %point.params.label(),
                analyzer = %summary.analyzer,
                failure_rate = summary.failure_rate.value,
                "high failure rate"
            );
        }
    }

    if let Some(p) = progress {
        p.finish_scenario();
    }
    Ok(Some(summaries))
}

fn run_points_sequential(
    study: &Study,
    points: &[ScenarioPoint],
    truths: &[GroundTruth],
    config: &SweepConfig,
    repeat: &RepeatConfig,
    progress: Option<&SweepProgress>,
) -> Result<Vec<PointOutcome>, StudyError> {
    points
        .iter()
        .zip(truths)
        .map(|(point, truth)| run_point(study, point, truth, config, repeat, progress))
        .collect()
}

#[cfg(feature = "parallel")]
fn run_points(
    study: &Study,
    points: &[ScenarioPoint],
    truths: &[GroundTruth],
    config: &SweepConfig,
    progress: Option<&SweepProgress>,
) -> Result<Vec<PointOutcome>, StudyError> {
    match config.parallelism {
        Parallelism::Sequential => {
            let repeat = RepeatConfig {
                parallel: false,
                ..config.repeat.clone()
            };
            run_points_sequential(study, points, truths, config, &repeat, progress)
        }
        Parallelism::Trials => {
            run_points_sequential(study, points, truths, config, &config.repeat, progress)
        }
        Parallelism::Scenarios => {
            let repeat = RepeatConfig {
                parallel: false,
                ..config.repeat.clone()
            };
            let run = || -> Result<Vec<PointOutcome>, StudyError> {
                points
                    .par_iter()
                    .zip(truths)
                    .map(|(point, truth)| run_point(study, point, truth, config, &repeat, progress))
                    .collect()
            };
            match config.repeat.workers {
                Some(workers) => rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| StudyError::ThreadPool(e.to_string()))?
                    .install(run),
                None => run(),
            }
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn run_points(
    study: &Study,
    points: &[ScenarioPoint],
    truths: &[GroundTruth],
    config: &SweepConfig,
    progress: Option<&SweepProgress>,
) -> Result<Vec<PointOutcome>, StudyError> {
    let repeat = RepeatConfig {
        parallel: false,
        ..config.repeat.clone()
    };
    run_points_sequential(study, points, truths, config, &repeat, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::OneSampleT;
    use crate::generate::OneSampleGenerator;
    use crate::params::ParamValue;
    use crate::sweep::Factor;

    fn study() -> Study {
        Study::builder()
            .generator(OneSampleGenerator::new())
            .analyzer(OneSampleT::new(0.95))
            .build()
            .unwrap()
    }

    fn config(trials: usize) -> SweepConfig {
        SweepConfig {
            repeat: RepeatConfig {
                trials,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_one_row_per_scenario_and_analyzer() {
        let design = Design::full_factorial(vec![Factor::new("n", [5_i64, 10, 20])]);
        let results = run_sweep(&study(), &design, &config(40), None).unwrap();

        assert_eq!(results.table.len(), 3);
        assert_eq!(results.summaries.len(), 3);
        assert_eq!(results.scenarios_completed, 3);
        assert!(!results.cancelled);
        assert_eq!(results.table.rows[2].levels, vec![ParamValue::Int(20)]);
        assert_eq!(results.table.factor_names, vec!["n".to_string()]);
    }

    #[test]
    fn test_invalid_scenario_fails_before_running() {
        let design = Design::full_factorial(vec![Factor::new("dist", ["normal", "lognormal"])])
            .with_fixed("n", 10);
        let progress = SweepProgress::new(0);
        let err = run_sweep(&study(), &design, &config(20), Some(&progress)).unwrap_err();

        assert!(matches!(err, StudyError::Config(ConfigError::UnknownDistribution(_))));
        assert_eq!(progress.completed(), 0);
    }

    #[test]
    fn test_cancelled_before_start_returns_no_rows() {
        let design = Design::full_factorial(vec![Factor::new("n", [5_i64, 10])]);
        let progress = SweepProgress::new(0);
        progress.cancel();

        let results = run_sweep(&study(), &design, &config(20), Some(&progress)).unwrap();
        assert!(results.cancelled);
        assert_eq!(results.scenarios_completed, 0);
        assert_eq!(results.scenarios_total, 2);
        assert!(results.table.is_empty());
    }

    #[test]
    fn test_progress_counts_trials() {
        let design = Design::full_factorial(vec![Factor::new("n", [5_i64, 10])]);
        let progress = SweepProgress::new(0);
        run_sweep(&study(), &design, &config(25), Some(&progress)).unwrap();

        assert_eq!(progress.total(), 50);
        assert_eq!(progress.completed(), 50);
        assert_eq!(progress.scenarios_completed(), 2);
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let design = Design::full_factorial(vec![Factor::new("n", [5_i64])]);
        let mut cfg = config(5);
        cfg.failure_warn_threshold = 2.0;
        assert!(run_sweep(&study(), &design, &cfg, None).is_err());
    }
}
