//! Tests for scenario sweeps
//!
//! These tests verify:
//! - A factorial sweep over sample size shows coverage converging to nominal
//! - Explicit designs run the listed scenarios in order
//! - Cancellation keeps the completed scenarios

use crate::analyze::{Analyzer, FnAnalyzer, OneSampleT};
use crate::generate::OneSampleGenerator;
use crate::model::{Dataset, Estimate};
use crate::params::{ParamValue, ScenarioParams};
use crate::repeat::RepeatConfig;
use crate::study::Study;
use crate::sweep::{Design, Factor, Parallelism, SweepConfig, SweepProgress, run_sweep};

fn t_study() -> Study {
    Study::builder()
        .generator(OneSampleGenerator::new())
        .analyzer(OneSampleT::new(0.95))
        .build()
        .unwrap()
}

fn sweep_config(trials: usize) -> SweepConfig {
    SweepConfig {
        repeat: RepeatConfig {
            trials,
            seed: 8_675_309,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_exponential_coverage_converges_with_sample_size() {
    let sizes = [5_i64, 10, 20, 40, 80, 160, 320, 740];
    let design = Design::full_factorial(vec![Factor::new("n", sizes)])
        .with_fixed("dist", "exponential")
        .with_fixed("rate", 1.0);
    let results = run_sweep(&t_study(), &design, &sweep_config(10_000), None).unwrap();

    assert_eq!(results.table.len(), sizes.len());
    let n_column: Vec<f64> = results
        .table
        .column_values("n")
        .unwrap()
        .into_iter()
        .map(Option::unwrap)
        .collect();
    assert_eq!(n_column, sizes.map(|n| n as f64).to_vec());

    let coverage: Vec<f64> = results
        .table
        .column_values("coverage")
        .unwrap()
        .into_iter()
        .map(Option::unwrap)
        .collect();

    for pair in coverage.windows(2) {
        assert!(
            pair[1] > pair[0] - 0.015,
            "coverage should not fall with n: {coverage:?}"
        );
    }
    assert!(coverage[0] < 0.93, "small-n coverage {}", coverage[0]);
    let last = coverage[coverage.len() - 1];
    assert!(last > 0.935 && last < 0.96, "large-n coverage {last}");

    // Skew still costs coverage at the largest n: the Monte Carlo interval
    // must reach below nominal, and the three largest sizes pooled stay under it.
    let last_lower = results.table.column_values("coverage_lower").unwrap()[sizes.len() - 1]
        .unwrap();
    assert!(last_lower < 0.95, "largest-n coverage interval starts at {last_lower}");
    let tail = coverage[coverage.len() - 3..].iter().sum::<f64>() / 3.0;
    assert!(tail < 0.95, "pooled large-n coverage {tail} should stay below 0.95");
}

#[test]
fn test_explicit_design_runs_listed_scenarios() {
    let design = Design::explicit(vec![
        ScenarioParams::new().with("n", 8).with("mean", 1.0),
        ScenarioParams::new().with("n", 30).with("mean", -2.0),
    ])
    .with_fixed("sd", 0.5);
    let results = run_sweep(&t_study(), &design, &sweep_config(200), None).unwrap();

    assert_eq!(results.table.len(), 2);
    assert_eq!(results.table.factor_names.len(), 2);
    assert_eq!(results.summaries[0].params.get("n"), Some(&ParamValue::Int(8)));
    assert_eq!(results.summaries[1].params.get("mean"), Some(&ParamValue::Float(-2.0)));
    assert!((results.summaries[1].mean_estimate.unwrap() + 2.0).abs() < 0.05);
}

#[test]
fn test_unknown_column_is_none() {
    let design = Design::full_factorial(vec![Factor::new("n", [6_i64])]);
    let results = run_sweep(&t_study(), &design, &sweep_config(10), None).unwrap();
    assert!(results.table.column_values("power").is_none());
}

/// Cancels the sweep the first time it runs. Scenarios already running
/// finish; later ones never start.
fn cancelling(progress: SweepProgress) -> impl Analyzer {
    FnAnalyzer::new("cancelling", move |data: &Dataset, _: &ScenarioParams| {
        progress.cancel();
        let mean = data.values().sum::<f64>() / data.len() as f64;
        Ok(Estimate::new().point(mean))
    })
}

#[test]
fn test_cancellation_keeps_completed_scenarios() {
    let progress = SweepProgress::new(0);
    let study = Study::builder()
        .generator(OneSampleGenerator::new())
        .analyzer(cancelling(progress.clone()))
        .build()
        .unwrap();
    let design = Design::full_factorial(vec![Factor::new("n", [5_i64, 10, 20, 40])]);
    let config = SweepConfig {
        parallelism: Parallelism::Sequential,
        ..sweep_config(50)
    };

    let results = run_sweep(&study, &design, &config, Some(&progress)).unwrap();

    assert!(results.cancelled);
    assert!(progress.is_cancelled());
    assert_eq!(results.scenarios_completed, 1);
    assert_eq!(results.scenarios_total, 4);
    assert_eq!(results.table.len(), 1);
    assert_eq!(results.table.rows[0].levels, vec![ParamValue::Int(5)]);
    assert_eq!(progress.completed(), 50);
}
