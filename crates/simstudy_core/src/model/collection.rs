//! Result collection for one scenario

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::estimate::{TrialOutcome, TrialResult};
use crate::params::ScenarioParams;

/// Ordered trial results for one scenario.
///
/// Grows one trial at a time. Every analyzer gets exactly one row per kept
/// trial; a dropped trial contributes no rows at all, so all analyzers always
/// see the same number of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultCollection {
    pub scenario: usize,
    /// Parameters the trials were run under
    #[serde(default)]
    pub params: ScenarioParams,
    analyzers: Vec<Arc<str>>,
    rows: Vec<TrialResult>,
    attempted: usize,
    dropped: usize,
    /// Failures per analyzer (same order as `analyzers`), including those of dropped trials
    failures: Vec<usize>,
}

impl ResultCollection {
    #[must_use]
    pub fn new(scenario: usize, analyzers: Vec<Arc<str>>) -> Self {
        let failures = vec![0; analyzers.len()];
        Self {
            scenario,
            params: ScenarioParams::new(),
            analyzers,
            rows: Vec::new(),
            attempted: 0,
            dropped: 0,
            failures,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: ScenarioParams) -> Self {
        self.params = params;
        self
    }

    /// Record a trial whose outcomes are all kept, one per analyzer in
    /// analyzer order. Failed outcomes stay in the collection as flagged rows.
    ///
    /// # Panics
    /// Panics if `outcomes` does not have one entry per analyzer.
    pub fn record_trial(&mut self, trial: usize, outcomes: Vec<TrialOutcome>) {
        assert_eq!(
            outcomes.len(),
            self.analyzers.len(),
            "one outcome per analyzer"
        );
        self.attempted += 1;
        for (idx, outcome) in outcomes.into_iter().enumerate() {
            if !outcome.is_success() {
                self.failures[idx] += 1;
            }
            self.rows.push(TrialResult {
                scenario: self.scenario,
                trial,
                analyzer: self.analyzers[idx].clone(),
                outcome,
            });
        }
    }

    /// Record a trial excluded from every analyzer. `failed` lists the
    /// indices of the analyzers that failed on it.
    pub fn record_dropped(&mut self, failed: &[usize]) {
        self.attempted += 1;
        self.dropped += 1;
        for &idx in failed {
            if let Some(count) = self.failures.get_mut(idx) {
                *count += 1;
            }
        }
    }

    #[must_use]
    pub fn analyzers(&self) -> &[Arc<str>] {
        &self.analyzers
    }

    #[must_use]
    pub fn analyzer_index(&self, name: &str) -> Option<usize> {
        self.analyzers.iter().position(|a| a.as_ref() == name)
    }

    #[must_use]
    pub fn rows(&self) -> &[TrialResult] {
        &self.rows
    }

    /// Rows of one analyzer, in trial order
    pub fn rows_for<'a>(&'a self, analyzer: &'a str) -> impl Iterator<Item = &'a TrialResult> + 'a {
        self.rows.iter().filter(move |r| r.analyzer.as_ref() == analyzer)
    }

    /// Trials started, including dropped ones
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Trials that contributed rows
    #[must_use]
    pub fn kept(&self) -> usize {
        self.attempted - self.dropped
    }

    /// Failures of one analyzer across all attempted trials
    #[must_use]
    pub fn failures(&self, analyzer_index: usize) -> usize {
        self.failures.get(analyzer_index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }

    /// Number of rows per analyzer, in analyzer order
    #[must_use]
    pub fn row_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.analyzers.len()];
        for row in &self.rows {
            if let Some(idx) = self.analyzer_index(&row.analyzer) {
                counts[idx] += 1;
            }
        }
        counts
    }
}
