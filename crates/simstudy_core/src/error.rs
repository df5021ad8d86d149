use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed or internally inconsistent configuration.
///
/// Always surfaces to the caller; never coerced into a default.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing parameter `{name}`")]
    MissingParameter { name: String },

    #[error("parameter `{name}` must be {expected}, found {found}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("parameter `{name}` = {value} is invalid: {reason}")]
    InvalidValue {
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("parameters {names:?} must have equal lengths, found {lengths:?}")]
    LengthMismatch {
        names: Vec<String>,
        lengths: Vec<usize>,
    },

    #[error("unknown distribution `{0}`")]
    UnknownDistribution(String),

    #[error("invalid design: {0}")]
    Design(String),

    #[error("invalid study: {0}")]
    Study(String),
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, value: f64, reason: &'static str) -> Self {
        ConfigError::InvalidValue {
            name: name.to_string(),
            value,
            reason,
        }
    }
}

/// Category of a recoverable per-trial failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Iterative fit did not converge
    NonConvergence,
    /// Data cannot support the analysis (too few observations, zero variance, ...)
    Degenerate,
    /// A numerical routine produced an unusable value
    Numerical,
    /// Anything else reported by an external analyzer
    Other,
}

/// A recoverable failure raised by an analyzer for a single trial.
///
/// The repeater captures these under its failure policy; they never cross the
/// repeater boundary unless the abort policy is selected.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{analyzer}: {kind:?}: {message}")]
pub struct TrialError {
    pub analyzer: String,
    pub kind: FailureKind,
    pub message: String,
}

impl TrialError {
    pub fn new(analyzer: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            analyzer: analyzer.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn degenerate(analyzer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(analyzer, FailureKind::Degenerate, message)
    }

    pub fn numerical(analyzer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(analyzer, FailureKind::Numerical, message)
    }

    pub fn non_convergence(analyzer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(analyzer, FailureKind::NonConvergence, message)
    }
}

/// Summarizing a result collection that cannot support a summary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("result collection for scenario {scenario} is empty")]
    EmptyCollection { scenario: usize },

    #[error(
        "result collection for scenario {scenario} is incomplete: \
         {attempted} attempted, {kept} kept, {dropped} dropped, analyzer `{analyzer}` has {rows} rows"
    )]
    Incomplete {
        scenario: usize,
        analyzer: String,
        attempted: usize,
        kept: usize,
        dropped: usize,
        rows: usize,
    },

    #[error("analyzer `{0}` is not part of the result collection")]
    UnknownAnalyzer(String),

    #[error("invalid aggregation setting: {0}")]
    Setting(String),
}

/// Top-level error for running a study
#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("trial {trial} of scenario {scenario} aborted the batch: {source}")]
    TrialAborted {
        scenario: usize,
        trial: usize,
        #[source]
        source: TrialError,
    },

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, StudyError>;
