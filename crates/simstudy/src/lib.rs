//! Command-line front end for simulation studies
//!
//! This crate reads YAML study files, runs them with `simstudy_core` and
//! renders the results:
//! - `cli` - Command-line arguments and the run entry point
//! - `config` - Study file format and conversion to core types
//! - `logging` - `tracing` subscriber setup
//! - `report` - Text, CSV and JSON output

pub mod cli;
pub mod config;
pub mod logging;
pub mod report;

pub use cli::{Args, install_interrupt_handler, run, run_with_progress};
pub use config::{AnalyzerSpec, DesignSpec, GeneratorSpec, RunSpec, StudyFile, StudyFileError};
pub use logging::init_logging;
pub use report::{OutputFormat, render};
