//! Scenario sweeps.
//!
//! A sweep runs the generate → repeat → aggregate pipeline once per scenario
//! of a [`Design`] and concatenates the summaries into one
//! [`StudyTable`](crate::table::StudyTable).
//!
//! Each scenario draws from its own seed stream (master seed and scenario
//! index), so scenarios are independent and the table does not depend on the
//! order in which they ran.

mod design;
mod progress;
mod runner;

pub use design::{Design, Factor, GridIndices, Layout, ScenarioPoint, flat_index};
pub use progress::SweepProgress;
pub use runner::{Parallelism, StudyResults, SweepConfig, run_sweep};
