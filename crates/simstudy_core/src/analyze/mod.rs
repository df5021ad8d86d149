//! Analysis procedures.
//!
//! An analyzer turns one dataset into one [`Estimate`]. Analyzers know
//! nothing about the simulation around them: they run just as well on real
//! data. Anything that goes wrong with a particular dataset (too few
//! observations, zero variance, a failed numerical routine) comes back as a
//! [`TrialError`] for the repeater to handle under its failure policy.

mod anova;
mod one_sample;
mod two_sample;

pub use anova::{AnovaF, WelchF};
pub use one_sample::OneSampleT;
pub use two_sample::{ClusterMeansT, PooledDiffT};

use crate::error::{ConfigError, TrialError};
use crate::model::{Dataset, Estimate};
use crate::params::ScenarioParams;

pub trait Analyzer: Send + Sync {
    /// Unique name within a study; used to tag result rows
    fn name(&self) -> &str;

    /// Check the analyzer's own settings. Called once when a study is built.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    fn analyze(&self, data: &Dataset, params: &ScenarioParams) -> Result<Estimate, TrialError>;
}

/// Analyzer backed by a closure, for wrapping external model code
pub struct FnAnalyzer<F> {
    name: String,
    analyze: F,
}

impl<F> FnAnalyzer<F>
where
    F: Fn(&Dataset, &ScenarioParams) -> Result<Estimate, TrialError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, analyze: F) -> Self {
        Self {
            name: name.into(),
            analyze,
        }
    }
}

impl<F> Analyzer for FnAnalyzer<F>
where
    F: Fn(&Dataset, &ScenarioParams) -> Result<Estimate, TrialError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, data: &Dataset, params: &ScenarioParams) -> Result<Estimate, TrialError> {
        (self.analyze)(data, params)
    }
}

pub(crate) fn check_confidence(confidence: f64) -> Result<(), ConfigError> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "confidence",
            confidence,
            "must be strictly between 0 and 1",
        ))
    }
}
