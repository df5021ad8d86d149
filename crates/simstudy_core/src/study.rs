//! A study: one generator and the analyzers compared on its data

use std::fmt;
use std::sync::Arc;

use crate::analyze::Analyzer;
use crate::error::ConfigError;
use crate::generate::Generator;
use crate::model::TrialOutcome;
use crate::params::ScenarioParams;
use crate::repeat::FailurePolicy;
use crate::rng::TrialRng;

/// Generator plus a non-empty list of uniquely named analyzers.
///
/// Cheap to clone; generator and analyzers are shared.
#[derive(Clone)]
pub struct Study {
    generator: Arc<dyn Generator>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    names: Vec<Arc<str>>,
}

impl Study {
    #[must_use]
    pub fn builder() -> StudyBuilder {
        StudyBuilder::default()
    }

    pub fn new(
        generator: Arc<dyn Generator>,
        analyzers: Vec<Arc<dyn Analyzer>>,
    ) -> Result<Self, ConfigError> {
        if analyzers.is_empty() {
            return Err(ConfigError::Study("at least one analyzer is required".to_string()));
        }

        let mut names: Vec<Arc<str>> = Vec::with_capacity(analyzers.len());
        for analyzer in &analyzers {
            analyzer.validate()?;
            let name = analyzer.name();
            if name.is_empty() {
                return Err(ConfigError::Study("analyzer names must not be empty".to_string()));
            }
            if names.iter().any(|n| n.as_ref() == name) {
                return Err(ConfigError::Study(format!("duplicate analyzer name `{name}`")));
            }
            names.push(Arc::from(name));
        }

        Ok(Self {
            generator,
            analyzers,
            names,
        })
    }

    #[must_use]
    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    #[must_use]
    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    /// Analyzer names in study order
    #[must_use]
    pub fn analyzer_names(&self) -> &[Arc<str>] {
        &self.names
    }

    /// Reject policies the study cannot honor. Comparing several analyzers
    /// requires every analyzer to see the same trials, so flagged rows are
    /// only allowed with a single analyzer.
    pub fn check_policy(&self, policy: FailurePolicy) -> Result<(), ConfigError> {
        if policy == FailurePolicy::Flag && self.analyzers.len() > 1 {
            return Err(ConfigError::Study(format!(
                "the flag failure policy needs a single analyzer, found {}; use drop to compare analyzers",
                self.analyzers.len()
            )));
        }
        Ok(())
    }

    /// Generate one dataset and run every analyzer on it, in study order.
    pub(crate) fn run_trial(
        &self,
        params: &ScenarioParams,
        rng: &mut TrialRng,
    ) -> Result<Vec<TrialOutcome>, ConfigError> {
        let data = self.generator.generate(params, rng)?;
        Ok(self
            .analyzers
            .iter()
            .map(|analyzer| analyzer.analyze(&data, params).into())
            .collect())
    }
}

impl fmt::Debug for Study {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Study")
            .field("generator", &self.generator.name())
            .field("analyzers", &self.names)
            .finish()
    }
}

#[derive(Default)]
pub struct StudyBuilder {
    generator: Option<Arc<dyn Generator>>,
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl StudyBuilder {
    #[must_use]
    pub fn generator(mut self, generator: impl Generator + 'static) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    #[must_use]
    pub fn shared_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzers.push(Arc::new(analyzer));
        self
    }

    #[must_use]
    pub fn shared_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn build(self) -> Result<Study, ConfigError> {
        let generator = self
            .generator
            .ok_or_else(|| ConfigError::Study("a generator is required".to_string()))?;
        Study::new(generator, self.analyzers)
    }
}
