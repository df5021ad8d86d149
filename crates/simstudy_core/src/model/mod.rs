//! Data passed between the stages of a study: datasets, per-trial
//! estimates, collected outcomes and summaries.

mod collection;
mod dataset;
mod estimate;
mod summary;

pub use collection::ResultCollection;
pub use dataset::{Dataset, GroundTruth, Observation};
pub use estimate::{Estimate, TrialOutcome, TrialResult};
pub use summary::{MetricEstimate, PerformanceSummary};
