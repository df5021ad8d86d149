//! Repetition harness: R independent trials of one scenario.
//!
//! Each trial draws from its own random stream, derived from the master seed,
//! the scenario index and the trial index, so a batch produces the same
//! result collection whatever the number of workers. Trial outcomes are
//! collected in trial order and only then folded under the failure policy.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StudyError};
use crate::model::{ResultCollection, TrialOutcome};
use crate::params::ScenarioParams;
use crate::rng::SeedStream;
use crate::study::Study;
use crate::sweep::SweepProgress;

/// What happens to a trial in which an analyzer fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the batch with the first failure (in trial order)
    Abort,
    /// Exclude the trial from every analyzer and count the failure
    #[default]
    Drop,
    /// Keep the trial with an explicit failed row (single analyzer only)
    Flag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatConfig {
    /// Number of trials per scenario (R)
    pub trials: usize,
    /// Master seed
    pub seed: u64,
    pub policy: FailurePolicy,
    /// Worker threads for trial-level parallelism; `None` uses the global pool
    pub workers: Option<usize>,
    /// Run trials in parallel (ignored without the `parallel` feature)
    pub parallel: bool,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            seed: 42,
            policy: FailurePolicy::Drop,
            workers: None,
            parallel: true,
        }
    }
}

/// Run `config.trials` trials of `study` under `params`.
///
/// The generator's ground truth is computed first so that invalid parameters
/// fail before any trial runs.
pub fn repeat_trials(
    study: &Study,
    params: &ScenarioParams,
    scenario_index: usize,
    config: &RepeatConfig,
) -> Result<ResultCollection, StudyError> {
    repeat_trials_with_progress(study, params, scenario_index, config, None)
}

/// [`repeat_trials`] that reports each finished trial to `progress`.
pub fn repeat_trials_with_progress(
    study: &Study,
    params: &ScenarioParams,
    scenario_index: usize,
    config: &RepeatConfig,
    progress: Option<&SweepProgress>,
) -> Result<ResultCollection, StudyError> {
    study.check_policy(config.policy)?;
    if config.workers == Some(0) {
        return Err(ConfigError::invalid("workers", 0.0, "must be at least 1").into());
    }
    study.generator().truth(params)?;

    let stream = SeedStream::new(config.seed).scenario(scenario_index);
    let runs = run_trials(study, params, stream, config, progress)?;

    let mut collection = ResultCollection::new(scenario_index, study.analyzer_names().to_vec())
        .with_params(params.clone());
    for (trial, run) in runs.into_iter().enumerate() {
        let outcomes = run?;
        let failed: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(idx, _)| idx)
            .collect();

        if failed.is_empty() {
            collection.record_trial(trial, outcomes);
            continue;
        }

        match config.policy {
            FailurePolicy::Abort => {
                let source = outcomes
                    .into_iter()
                    .find_map(|outcome| match outcome {
                        TrialOutcome::Failed(err) => Some(err),
                        TrialOutcome::Success(_) => None,
                    });
                if let Some(source) = source {
                    return Err(StudyError::TrialAborted {
                        scenario: scenario_index,
                        trial,
                        source,
                    });
                }
            }
            FailurePolicy::Drop => collection.record_dropped(&failed),
            FailurePolicy::Flag => collection.record_trial(trial, outcomes),
        }
    }

    tracing::debug!(
        scenario = scenario_index,
        attempted = collection.attempted(),
        dropped = collection.dropped(),
        "batch complete"
    );

    Ok(collection)
}

type TrialRun = Result<Vec<TrialOutcome>, ConfigError>;

fn run_one(
    study: &Study,
    params: &ScenarioParams,
    stream: SeedStream,
    trial: usize,
    progress: Option<&SweepProgress>,
) -> TrialRun {
    let mut rng = stream.trial_rng(trial);
    let outcomes = study.run_trial(params, &mut rng);
    if let Some(p) = progress {
        p.increment();
    }
    outcomes
}

fn run_sequential(
    study: &Study,
    params: &ScenarioParams,
    stream: SeedStream,
    trials: usize,
    progress: Option<&SweepProgress>,
) -> Vec<TrialRun> {
    (0..trials)
        .map(|trial| run_one(study, params, stream, trial, progress))
        .collect()
}

#[cfg(feature = "parallel")]
fn run_trials(
    study: &Study,
    params: &ScenarioParams,
    stream: SeedStream,
    config: &RepeatConfig,
    progress: Option<&SweepProgress>,
) -> Result<Vec<TrialRun>, StudyError> {
    if !config.parallel {
        return Ok(run_sequential(study, params, stream, config.trials, progress));
    }

    let run = || -> Vec<TrialRun> {
        (0..config.trials)
            .into_par_iter()
            .map(|trial| run_one(study, params, stream, trial, progress))
            .collect()
    };

    match config.workers {
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| StudyError::ThreadPool(e.to_string()))?;
            Ok(pool.install(run))
        }
        None => Ok(run()),
    }
}

#[cfg(not(feature = "parallel"))]
fn run_trials(
    study: &Study,
    params: &ScenarioParams,
    stream: SeedStream,
    config: &RepeatConfig,
    progress: Option<&SweepProgress>,
) -> Result<Vec<TrialRun>, StudyError> {
    Ok(run_sequential(study, params, stream, config.trials, progress))
}
