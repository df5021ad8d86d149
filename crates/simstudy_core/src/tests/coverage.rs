//! Tests for the statistical behavior the driver is meant to measure
//!
//! These tests verify:
//! - The t interval reaches nominal coverage for normal data
//! - The t interval under-covers for skewed data at small n
//! - Welch's F holds its level where the classic F does not
//! - Ignoring clustering destroys interval coverage

use crate::aggregate::{AggregateConfig, summarize};
use crate::analyze::{AnovaF, ClusterMeansT, OneSampleT, PooledDiffT, WelchF};
use crate::generate::{ClusterRctGenerator, Generator, GroupsGenerator, OneSampleGenerator};
use crate::model::PerformanceSummary;
use crate::params::ScenarioParams;
use crate::repeat::{RepeatConfig, repeat_trials};
use crate::study::Study;

fn run(
    study: &Study,
    params: &ScenarioParams,
    trials: usize,
    level: f64,
) -> Vec<PerformanceSummary> {
    let config = RepeatConfig {
        trials,
        seed: 20_240_601,
        ..Default::default()
    };
    let collection = repeat_trials(study, params, 0, &config).unwrap();
    let truth = study.generator().truth(params).unwrap();
    let aggregate = AggregateConfig {
        uncertainty_level: level,
        ..Default::default()
    };
    summarize(&collection, &truth, &aggregate).unwrap()
}

fn t_study() -> Study {
    Study::builder()
        .generator(OneSampleGenerator::new())
        .analyzer(OneSampleT::new(0.95))
        .build()
        .unwrap()
}

#[test]
fn test_t_interval_nominal_for_normal_data() {
    let params = ScenarioParams::new()
        .with("n", 15)
        .with("dist", "normal")
        .with("mean", 3.0)
        .with("sd", 2.0);
    let summary = &run(&t_study(), &params, 10_000, 0.95)[0];

    let coverage = summary.coverage.unwrap();
    assert_eq!(coverage.trials, 10_000);
    assert!(
        coverage.contains(0.95),
        "coverage {} [{}, {}] should contain 0.95",
        coverage.value,
        coverage.lower,
        coverage.upper
    );
    let bias = summary.bias.unwrap();
    assert!(bias.value.abs() < 4.0 * bias.mcse, "bias {} (mcse {})", bias.value, bias.mcse);
}

#[test]
fn test_t_interval_undercovers_for_exponential() {
    let params = ScenarioParams::new()
        .with("n", 10)
        .with("dist", "exponential")
        .with("rate", 1.0);
    let summary = &run(&t_study(), &params, 10_000, 0.95)[0];

    let coverage = summary.coverage.unwrap();
    assert!(
        coverage.value > 0.87 && coverage.value < 0.935,
        "coverage {} should be well below nominal",
        coverage.value
    );
    assert!(
        coverage.upper < 0.95,
        "uncertainty interval [{}, {}] should exclude 0.95",
        coverage.lower,
        coverage.upper
    );
}

#[test]
fn test_welch_holds_level_under_heteroskedasticity() {
    let study = Study::builder()
        .generator(GroupsGenerator::new())
        .analyzer(AnovaF::new())
        .analyzer(WelchF::new())
        .build()
        .unwrap();
    // Largest variance in the smallest group
    let params = ScenarioParams::new()
        .with("mu", vec![0.0, 0.0, 0.0])
        .with("sigma_sq", vec![1.0, 4.0, 9.0])
        .with("sample_size", vec![20.0, 10.0, 5.0]);

    let summaries = run(&study, &params, 3_000, 0.95);
    let anova = summaries[0].rejection_rate.unwrap().value;
    let welch = summaries[1].rejection_rate.unwrap().value;

    assert!(anova > 0.08, "classic F rejection rate {anova} should be inflated");
    assert!(welch < 0.09, "Welch F rejection rate {welch} should be near 0.05");
    assert!(welch < anova);

    // Unequal variances trigger the classic F warning
    assert!(summaries[0].warning_rate.unwrap().value > 0.5);
    assert_eq!(summaries[1].warning_rate.unwrap().value, 0.0);
}

#[test]
fn test_ignoring_clusters_undercovers() {
    let study = Study::builder()
        .generator(ClusterRctGenerator::new())
        .analyzer(ClusterMeansT::new(0.95))
        .analyzer(PooledDiffT::new(0.95))
        .build()
        .unwrap();
    let params = ScenarioParams::new()
        .with("n_sites", 20)
        .with("n_bar", 30)
        .with("icc", 0.2)
        .with("ate", 0.3);

    let summaries = run(&study, &params, 1_000, 0.95);
    let cluster = summaries[0].coverage.unwrap().value;
    let pooled = summaries[1].coverage.unwrap().value;

    assert!(cluster > 0.92, "cluster-level coverage {cluster}");
    assert!(pooled < 0.8, "pooled coverage {pooled} should collapse");
    assert!(summaries[0].bias.unwrap().value.abs() < 0.05);
}

#[test]
fn test_truth_is_what_generator_reports() {
    let params = ScenarioParams::new()
        .with("n", 10)
        .with("dist", "uniform")
        .with("min", 0.0)
        .with("max", 4.0);
    let truth = OneSampleGenerator::new().truth(&params).unwrap();
    let summary = &run(&t_study(), &params, 500, 0.95)[0];

    assert_eq!(truth.value, Some(2.0));
    assert!((summary.mean_estimate.unwrap() - 2.0).abs() < 0.1);
}
