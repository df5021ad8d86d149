//! Integration tests for the simulation-study driver
//!
//! Tests are organized by topic:
//! - `determinism` - Seed streams and worker-count independence
//! - `coverage` - Statistical behavior of the reference analyzers
//! - `policies` - Failure policies and collection invariants
//! - `sweep` - Factorial sweeps, parallelism modes and cancellation

mod coverage;
mod determinism;
mod sweep;
