use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};

use super::Generator;
use crate::error::ConfigError;
use crate::model::{Dataset, GroundTruth, Observation};
use crate::params::ScenarioParams;
use crate::rng::TrialRng;

/// Cluster-randomized trial: sites are assigned to treatment as a whole and
/// share a site-level random effect.
///
/// Outcomes are standardized so that the total variance is one:
/// `y = ate * treated + u_site + e`, with `u_site ~ N(0, icc)` and
/// `e ~ N(0, 1 - icc)`.
///
/// | parameter | default | meaning |
/// |---|---|---|
/// | `n_sites` | required | number of sites, at least 2 |
/// | `n_bar` | required | average site size |
/// | `size_spread` | 0 | relative half-width of the site-size range, in [0, 1) |
/// | `icc` | 0 | intraclass correlation, in [0, 1) |
/// | `ate` | 0 | average treatment effect |
/// | `p_treat` | 0.5 | share of sites treated |
///
/// With `size_spread = 0` every site has exactly `n_bar` members; otherwise
/// each site size is drawn uniformly from
/// `round(n_bar * (1 - size_spread))..=round(n_bar * (1 + size_spread))`
/// (never below 1).
#[derive(Debug, Clone, Default)]
pub struct ClusterRctGenerator;

#[derive(Debug, Clone, Copy)]
struct ClusterDesign {
    n_sites: usize,
    n_bar: usize,
    size_spread: f64,
    icc: f64,
    ate: f64,
    n_treated: usize,
}

impl ClusterDesign {
    fn from_params(params: &ScenarioParams) -> Result<Self, ConfigError> {
        let n_sites = params.usize("n_sites")?;
        if n_sites < 2 {
            return Err(ConfigError::invalid("n_sites", n_sites as f64, "must be at least 2"));
        }
        let n_bar = params.usize("n_bar")?;
        if n_bar == 0 {
            return Err(ConfigError::invalid("n_bar", 0.0, "must be at least 1"));
        }
        let size_spread = params.f64_or("size_spread", 0.0)?;
        if !(0.0..1.0).contains(&size_spread) {
            return Err(ConfigError::invalid("size_spread", size_spread, "must be in [0, 1)"));
        }
        let icc = params.f64_or("icc", 0.0)?;
        if !(0.0..1.0).contains(&icc) {
            return Err(ConfigError::invalid("icc", icc, "must be in [0, 1)"));
        }
        let ate = params.f64_or("ate", 0.0)?;
        if !ate.is_finite() {
            return Err(ConfigError::invalid("ate", ate, "must be finite"));
        }
        let p_treat = params.f64_or("p_treat", 0.5)?;
        if !(p_treat > 0.0 && p_treat < 1.0) {
            return Err(ConfigError::invalid("p_treat", p_treat, "must be in (0, 1)"));
        }

        // Both arms keep at least one site
        let n_treated = ((n_sites as f64 * p_treat).round() as usize).clamp(1, n_sites - 1);

        Ok(Self {
            n_sites,
            n_bar,
            size_spread,
            icc,
            ate,
            n_treated,
        })
    }

    fn site_size(&self, rng: &mut TrialRng) -> usize {
        if self.size_spread == 0.0 {
            return self.n_bar;
        }
        let n_bar = self.n_bar as f64;
        let low = (n_bar * (1.0 - self.size_spread)).round().max(1.0) as usize;
        let high = ((n_bar * (1.0 + self.size_spread)).round() as usize).max(low);
        rng.random_range(low..=high)
    }
}

impl ClusterRctGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Generator for ClusterRctGenerator {
    fn name(&self) -> &str {
        "cluster_rct"
    }

    fn truth(&self, params: &ScenarioParams) -> Result<GroundTruth, ConfigError> {
        let design = ClusterDesign::from_params(params)?;
        Ok(GroundTruth::value(design.ate).with_null(design.ate == 0.0))
    }

    fn generate(&self, params: &ScenarioParams, rng: &mut TrialRng) -> Result<Dataset, ConfigError> {
        let design = ClusterDesign::from_params(params)?;

        let site_effect = Normal::new(0.0, design.icc.sqrt())
            .map_err(|_| ConfigError::invalid("icc", design.icc, "must be in [0, 1)"))?;
        let residual = Normal::new(0.0, (1.0 - design.icc).sqrt())
            .map_err(|_| ConfigError::invalid("icc", design.icc, "must be in [0, 1)"))?;

        let mut treated: Vec<bool> = (0..design.n_sites).map(|s| s < design.n_treated).collect();
        treated.shuffle(rng);

        let mut observations = Vec::with_capacity(design.n_sites * design.n_bar);
        for (site, &is_treated) in treated.iter().enumerate() {
            let size = design.site_size(rng);
            let u = site_effect.sample(rng);
            let shift = if is_treated { design.ate } else { 0.0 };
            for _ in 0..size {
                observations.push(Observation {
                    group: usize::from(is_treated),
                    cluster: Some(site),
                    value: shift + u + residual.sample(rng),
                });
            }
        }
        Ok(Dataset::new(observations))
    }
}
