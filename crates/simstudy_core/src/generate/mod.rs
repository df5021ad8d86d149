//! Data-generating models.
//!
//! A generator is a pure function of the scenario parameters and the random
//! source it is handed. It validates its parameters up front (`truth` is
//! called once per batch before any trial runs) and reports the ground truth
//! the analyzers are judged against.

mod cluster;
mod groups;
mod one_sample;

pub use cluster::ClusterRctGenerator;
pub use groups::GroupsGenerator;
pub use one_sample::{OneSampleGenerator, SampleDistribution};

use crate::error::ConfigError;
use crate::model::{Dataset, GroundTruth};
use crate::params::ScenarioParams;
use crate::rng::TrialRng;

pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    /// Validate `params` and return the truth they encode.
    fn truth(&self, params: &ScenarioParams) -> Result<GroundTruth, ConfigError>;

    /// Draw one dataset.
    fn generate(&self, params: &ScenarioParams, rng: &mut TrialRng) -> Result<Dataset, ConfigError>;
}

/// Generator built from a pair of closures
pub struct FnGenerator<T, G> {
    name: String,
    truth: T,
    generate: G,
}

impl<T, G> FnGenerator<T, G>
where
    T: Fn(&ScenarioParams) -> Result<GroundTruth, ConfigError> + Send + Sync,
    G: Fn(&ScenarioParams, &mut TrialRng) -> Result<Dataset, ConfigError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, truth: T, generate: G) -> Self {
        Self {
            name: name.into(),
            truth,
            generate,
        }
    }
}

impl<T, G> Generator for FnGenerator<T, G>
where
    T: Fn(&ScenarioParams) -> Result<GroundTruth, ConfigError> + Send + Sync,
    G: Fn(&ScenarioParams, &mut TrialRng) -> Result<Dataset, ConfigError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn truth(&self, params: &ScenarioParams) -> Result<GroundTruth, ConfigError> {
        (self.truth)(params)
    }

    fn generate(&self, params: &ScenarioParams, rng: &mut TrialRng) -> Result<Dataset, ConfigError> {
        (self.generate)(params, rng)
    }
}
