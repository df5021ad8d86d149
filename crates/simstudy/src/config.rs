//! Study files.
//!
//! A study file is a YAML document naming the generator, the analyzers, the
//! scenario design and the run settings:
//!
//! ```yaml
//! generator:
//!   type: one_sample
//! analyzers:
//!   - type: one_sample_t
//!     confidence: 0.95
//! design:
//!   fixed:
//!     dist: exponential
//!     rate: 1.0
//!   factors:
//!     - name: n
//!       levels: [5, 10, 20, 40]
//! run:
//!   trials: 10000
//!   seed: 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use simstudy_core::sweep::Layout;
use simstudy_core::{
    AggregateConfig, AnovaF, ClusterMeansT, ClusterRctGenerator, ConfigError, Design, Factor,
    FailurePolicy, GroupsGenerator, OneSampleGenerator, OneSampleT, Parallelism, PooledDiffT,
    RepeatConfig, ScenarioParams, Study, StudyBuilder, SweepConfig, WelchF,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudyFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse study file: {0}")]
    Parse(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Built-in data-generating models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorSpec {
    OneSample,
    Groups,
    ClusterRct,
}

fn default_confidence() -> f64 {
    0.95
}

/// Built-in analyzers. `name` overrides the default analyzer name, which is
/// needed when the same analyzer appears twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalyzerSpec {
    OneSampleT {
        #[serde(default = "default_confidence")]
        confidence: f64,
        /// Hypothesized mean; read from the `mu0` parameter when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        null: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    AnovaF {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    WelchF {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    ClusterMeansT {
        #[serde(default = "default_confidence")]
        confidence: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    PooledDiffT {
        #[serde(default = "default_confidence")]
        confidence: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl AnalyzerSpec {
    fn add_to(&self, builder: StudyBuilder) -> StudyBuilder {
        match self {
            AnalyzerSpec::OneSampleT {
                confidence,
                null,
                name,
            } => {
                let mut analyzer = OneSampleT::new(*confidence);
                if let Some(null) = null {
                    analyzer = analyzer.with_null(*null);
                }
                if let Some(name) = name {
                    analyzer = analyzer.named(name.clone());
                }
                builder.analyzer(analyzer)
            }
            AnalyzerSpec::AnovaF { name } => match name {
                Some(name) => builder.analyzer(AnovaF::new().named(name.clone())),
                None => builder.analyzer(AnovaF::new()),
            },
            AnalyzerSpec::WelchF { name } => match name {
                Some(name) => builder.analyzer(WelchF::new().named(name.clone())),
                None => builder.analyzer(WelchF::new()),
            },
            AnalyzerSpec::ClusterMeansT { confidence, name } => {
                let analyzer = ClusterMeansT::new(*confidence);
                match name {
                    Some(name) => builder.analyzer(analyzer.named(name.clone())),
                    None => builder.analyzer(analyzer),
                }
            }
            AnalyzerSpec::PooledDiffT { confidence, name } => {
                let analyzer = PooledDiffT::new(*confidence);
                match name {
                    Some(name) => builder.analyzer(analyzer.named(name.clone())),
                    None => builder.analyzer(analyzer),
                }
            }
        }
    }
}

/// Scenario design: either `factors` (crossed) or an explicit `scenarios`
/// list, plus parameters shared by every scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSpec {
    pub fixed: ScenarioParams,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub factors: Vec<Factor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<ScenarioParams>>,
}

impl DesignSpec {
    pub fn to_design(&self) -> Result<Design, ConfigError> {
        let layout = match &self.scenarios {
            Some(_) if !self.factors.is_empty() => {
                return Err(ConfigError::Design(
                    "give either `factors` or `scenarios`, not both".to_string(),
                ));
            }
            Some(scenarios) => Layout::Explicit(scenarios.clone()),
            None => Layout::Factorial(self.factors.clone()),
        };
        let design = Design {
            fixed: self.fixed.clone(),
            layout,
        };
        design.validate()?;
        Ok(design)
    }
}

fn default_warn_threshold() -> f64 {
    0.10
}

/// Batch and execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSpec {
    pub trials: usize,
    pub seed: u64,
    pub policy: FailurePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    pub parallelism: Parallelism,
    #[serde(default = "default_warn_threshold")]
    pub failure_warn_threshold: f64,
}

impl Default for RunSpec {
    fn default() -> Self {
        let repeat = RepeatConfig::default();
        Self {
            trials: repeat.trials,
            seed: repeat.seed,
            policy: repeat.policy,
            workers: repeat.workers,
            parallelism: Parallelism::default(),
            failure_warn_threshold: default_warn_threshold(),
        }
    }
}

/// A complete study read from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub generator: GeneratorSpec,
    pub analyzers: Vec<AnalyzerSpec>,
    pub design: DesignSpec,
    #[serde(default)]
    pub run: RunSpec,
    #[serde(default)]
    pub summary: AggregateConfig,
}

impl StudyFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, StudyFileError> {
        serde_saphyr::from_str(yaml).map_err(|e| StudyFileError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, StudyFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| StudyFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file = Self::from_yaml(&content)?;
        tracing::debug!(
            path = %path.display(),
            analyzers = file.analyzers.len(),
            "loaded study file"
        );
        Ok(file)
    }

    pub fn study(&self) -> Result<Study, ConfigError> {
        let builder = match self.generator {
            GeneratorSpec::OneSample => Study::builder().generator(OneSampleGenerator::new()),
            GeneratorSpec::Groups => Study::builder().generator(GroupsGenerator::new()),
            GeneratorSpec::ClusterRct => Study::builder().generator(ClusterRctGenerator::new()),
        };
        self.analyzers
            .iter()
            .fold(builder, |builder, spec| spec.add_to(builder))
            .build()
    }

    pub fn design(&self) -> Result<Design, ConfigError> {
        self.design.to_design()
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            repeat: RepeatConfig {
                trials: self.run.trials,
                seed: self.run.seed,
                policy: self.run.policy,
                workers: self.run.workers,
                ..Default::default()
            },
            aggregate: self.summary,
            parallelism: self.run.parallelism,
            failure_warn_threshold: self.run.failure_warn_threshold,
        }
    }
}
