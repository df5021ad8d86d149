use rand_distr::{Distribution, Normal};

use super::Generator;
use crate::error::ConfigError;
use crate::model::{Dataset, GroundTruth};
use crate::params::ScenarioParams;
use crate::rng::TrialRng;

/// Independent normal groups with their own means, variances and sizes
/// (the heteroskedastic one-way ANOVA setting).
///
/// Parameters are the equal-length lists `mu`, `sigma_sq` and `sample_size`,
/// one entry per group. Lists are never recycled: a length mismatch is a
/// configuration error.
#[derive(Debug, Clone, Default)]
pub struct GroupsGenerator;

/// Validated per-group settings
struct GroupSpec {
    mu: f64,
    sd: f64,
    size: usize,
}

impl GroupsGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn groups(params: &ScenarioParams) -> Result<Vec<GroupSpec>, ConfigError> {
        let k = params.require_equal_lengths(&["mu", "sigma_sq", "sample_size"])?;
        if k < 2 {
            return Err(ConfigError::invalid("mu", k as f64, "need at least two groups"));
        }

        let mu = params.list("mu")?;
        let sigma_sq = params.list("sigma_sq")?;
        let sample_size = params.list("sample_size")?;

        mu.iter()
            .zip(sigma_sq)
            .zip(sample_size)
            .map(|((&mu, &var), &size)| {
                if !mu.is_finite() {
                    return Err(ConfigError::invalid("mu", mu, "must be finite"));
                }
                if !(var > 0.0 && var.is_finite()) {
                    return Err(ConfigError::invalid("sigma_sq", var, "must be positive and finite"));
                }
                if !(size >= 1.0 && size.fract() == 0.0 && size.is_finite()) {
                    return Err(ConfigError::invalid(
                        "sample_size",
                        size,
                        "must be a positive whole number",
                    ));
                }
                Ok(GroupSpec {
                    mu,
                    sd: var.sqrt(),
                    size: size as usize,
                })
            })
            .collect()
    }
}

impl Generator for GroupsGenerator {
    fn name(&self) -> &str {
        "groups"
    }

    fn truth(&self, params: &ScenarioParams) -> Result<GroundTruth, ConfigError> {
        let groups = Self::groups(params)?;
        let max = groups.iter().map(|g| g.mu).fold(f64::NEG_INFINITY, f64::max);
        let min = groups.iter().map(|g| g.mu).fold(f64::INFINITY, f64::min);
        Ok(GroundTruth::value(max - min).with_null(max == min))
    }

    fn generate(&self, params: &ScenarioParams, rng: &mut TrialRng) -> Result<Dataset, ConfigError> {
        let groups = Self::groups(params)?;
        let mut values: Vec<Vec<f64>> = Vec::with_capacity(groups.len());
        for group in &groups {
            let dist = Normal::new(group.mu, group.sd)
                .map_err(|_| ConfigError::invalid("sigma_sq", group.sd, "must be positive and finite"))?;
            values.push((0..group.size).map(|_| dist.sample(rng)).collect());
        }
        Ok(Dataset::from_groups(values))
    }
}
