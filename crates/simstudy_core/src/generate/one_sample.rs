use rand_distr::{Distribution, Exp, Normal, StudentT, Uniform};

use super::Generator;
use crate::error::ConfigError;
use crate::model::{Dataset, GroundTruth};
use crate::params::ScenarioParams;
use crate::rng::TrialRng;

/// Population a one-sample dataset is drawn from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleDistribution {
    Normal { mean: f64, sd: f64 },
    Exponential { rate: f64 },
    /// Student's t with `df` degrees of freedom, shifted to `mean`
    StudentT { df: f64, mean: f64 },
    Uniform { min: f64, max: f64 },
}

impl SampleDistribution {
    /// Read the distribution named by `dist` (default `normal`) and its
    /// parameters.
    pub fn from_params(params: &ScenarioParams) -> Result<Self, ConfigError> {
        let dist = match params.text_or("dist", "normal")? {
            "normal" => {
                let sd = params.f64_or("sd", 1.0)?;
                if !(sd > 0.0 && sd.is_finite()) {
                    return Err(ConfigError::invalid("sd", sd, "must be positive and finite"));
                }
                SampleDistribution::Normal {
                    mean: params.f64_or("mean", 0.0)?,
                    sd,
                }
            }
            "exponential" => {
                let rate = params.f64_or("rate", 1.0)?;
                if !(rate > 0.0 && rate.is_finite()) {
                    return Err(ConfigError::invalid("rate", rate, "must be positive and finite"));
                }
                SampleDistribution::Exponential { rate }
            }
            "t" => {
                let df = params.f64("df")?;
                // The mean only exists for df > 1
                if !(df > 1.0 && df.is_finite()) {
                    return Err(ConfigError::invalid("df", df, "must be greater than 1"));
                }
                SampleDistribution::StudentT {
                    df,
                    mean: params.f64_or("mean", 0.0)?,
                }
            }
            "uniform" => {
                let min = params.f64_or("min", 0.0)?;
                let max = params.f64_or("max", 1.0)?;
                if !(min < max && max.is_finite() && min.is_finite()) {
                    return Err(ConfigError::invalid("max", max, "must be finite and exceed min"));
                }
                SampleDistribution::Uniform { min, max }
            }
            other => return Err(ConfigError::UnknownDistribution(other.to_string())),
        };
        Ok(dist)
    }

    /// Population mean
    #[must_use]
    pub fn mean(&self) -> f64 {
        match *self {
            SampleDistribution::Normal { mean, .. } => mean,
            SampleDistribution::Exponential { rate } => 1.0 / rate,
            SampleDistribution::StudentT { mean, .. } => mean,
            SampleDistribution::Uniform { min, max } => (min + max) / 2.0,
        }
    }

    pub fn sample_n(&self, n: usize, rng: &mut TrialRng) -> Result<Vec<f64>, ConfigError> {
        let values = match *self {
            SampleDistribution::Normal { mean, sd } => {
                let dist = Normal::new(mean, sd)
                    .map_err(|_| ConfigError::invalid("sd", sd, "must be positive and finite"))?;
                (0..n).map(|_| dist.sample(rng)).collect()
            }
            SampleDistribution::Exponential { rate } => {
                let dist = Exp::new(rate)
                    .map_err(|_| ConfigError::invalid("rate", rate, "must be positive and finite"))?;
                (0..n).map(|_| dist.sample(rng)).collect()
            }
            SampleDistribution::StudentT { df, mean } => {
                let dist = StudentT::new(df)
                    .map_err(|_| ConfigError::invalid("df", df, "must be positive and finite"))?;
                (0..n).map(|_| mean + dist.sample(rng)).collect()
            }
            SampleDistribution::Uniform { min, max } => {
                let dist = Uniform::new(min, max)
                    .map_err(|_| ConfigError::invalid("max", max, "must be finite and exceed min"))?;
                (0..n).map(|_| dist.sample(rng)).collect()
            }
        };
        Ok(values)
    }
}

/// `n` independent draws from one population.
///
/// Parameters: `n`, `dist` (`normal` with `mean`/`sd`, `exponential` with
/// `rate`, `t` with `df`/`mean`, `uniform` with `min`/`max`) and an optional
/// null value `mu0`. The truth is the population mean.
#[derive(Debug, Clone, Default)]
pub struct OneSampleGenerator;

impl OneSampleGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn sample_size(params: &ScenarioParams) -> Result<usize, ConfigError> {
        let n = params.usize("n")?;
        if n == 0 {
            return Err(ConfigError::invalid("n", 0.0, "must be at least 1"));
        }
        Ok(n)
    }
}

impl Generator for OneSampleGenerator {
    fn name(&self) -> &str {
        "one_sample"
    }

    fn truth(&self, params: &ScenarioParams) -> Result<GroundTruth, ConfigError> {
        Self::sample_size(params)?;
        let mean = SampleDistribution::from_params(params)?.mean();
        let truth = GroundTruth::value(mean);
        if params.contains("mu0") {
            let mu0 = params.f64("mu0")?;
            Ok(truth.with_null((mean - mu0).abs() <= 1e-12 * mean.abs().max(1.0)))
        } else {
            Ok(truth)
        }
    }

    fn generate(&self, params: &ScenarioParams, rng: &mut TrialRng) -> Result<Dataset, ConfigError> {
        let n = Self::sample_size(params)?;
        let dist = SampleDistribution::from_params(params)?;
        Ok(Dataset::from_values(dist.sample_n(n, rng)?))
    }
}
