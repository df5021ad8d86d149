//! Monte Carlo simulation-study driver
//!
//! This crate runs simulation studies that evaluate statistical procedures
//! (interval coverage, Type-I error, power, bias) with the workflow
//! generate → analyze → repeat → summarize:
//! - A [`Generator`] draws one synthetic dataset from a parameterized model
//! - One or more [`Analyzer`]s turn a dataset into an [`Estimate`]
//! - The repeater runs R independent, reproducibly seeded trials
//! - The aggregator reduces trial results to performance metrics with
//!   Monte Carlo uncertainty intervals
//! - A sweep repeats the whole pipeline over a factorial design
//!
//! # Example
//!
//! ```ignore
//! use simstudy_core::{Design, Factor, OneSampleGenerator, OneSampleT, Study, SweepConfig};
//! use simstudy_core::sweep::run_sweep;
//!
//! let study = Study::builder()
//!     .generator(OneSampleGenerator::new())
//!     .analyzer(OneSampleT::new(0.95))
//!     .build()?;
//!
//! let design = Design::full_factorial(vec![Factor::new("n", [5_i64, 10, 20, 40])])
//!     .with_fixed("dist", "exponential")
//!     .with_fixed("rate", 1.0);
//!
//! let results = run_sweep(&study, &design, &SweepConfig::default(), None)?;
//! for row in &results.table.rows {
//!     println!("{:?} {:?}", row.levels, row.coverage);
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod aggregate;
pub mod analyze;
pub mod error;
pub mod generate;
pub mod params;
pub mod repeat;
pub mod rng;
pub mod stats;
pub mod study;
pub mod sweep;
pub mod table;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use aggregate::{AggregateConfig, ProportionInterval, summarize, summarize_analyzer};
pub use analyze::{AnovaF, Analyzer, ClusterMeansT, FnAnalyzer, OneSampleT, PooledDiffT, WelchF};
pub use error::{AggregateError, ConfigError, FailureKind, StudyError, TrialError};
pub use generate::{
    ClusterRctGenerator, FnGenerator, Generator, GroupsGenerator, OneSampleGenerator,
};
pub use model::{
    Dataset, Estimate, GroundTruth, MetricEstimate, Observation, PerformanceSummary,
    ResultCollection, TrialOutcome, TrialResult,
};
pub use params::{ParamValue, ScenarioParams};
pub use repeat::{FailurePolicy, RepeatConfig, repeat_trials};
pub use rng::{SeedStream, TrialRng};
pub use study::{Study, StudyBuilder};
pub use sweep::{Design, Factor, Parallelism, StudyResults, SweepConfig, SweepProgress};
pub use table::{ColumnType, StudyRow, StudyTable};
