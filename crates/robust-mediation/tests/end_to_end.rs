//! End-to-end tests of fitting and testing mediation models

mod common;

use common::*;
use robust_confidence::{Alternative, IntervalType};
use robust_core::{SequentialEngine, Warning};
use robust_mediation::{
    fit_mediation, run_bootstrap_test_with_engine, test_mediation_with_engine, FitOptions,
    FittedModel, MediationFit, MediationTerms, TestOptions,
};
use robust_regression::{PsiControl, RobustControl};

fn classical_huber() -> FitOptions {
    FitOptions::robust_regression()
        .with_regression_control(RobustControl::default().with_psi(PsiControl::huber().with_tuning(1e6)))
}

#[test]
fn noiseless_single_mediator_standard_and_fast_robust_agree() {
    init_tracing();
    let data = noiseless_single_mediator(100);
    let terms = MediationTerms::new("x", "y", &["m"]);

    let ols = fit_mediation(&data, &terms, &FitOptions::least_squares()).unwrap();
    let robust = fit_mediation(&data, &terms, &classical_huber()).unwrap();

    let effects = ols.effects();
    assert_relative_eq!(effects.indirect[0], 0.2, epsilon = 1e-10);
    assert_relative_eq!(effects.total, 0.3, epsilon = 1e-10);
    assert_relative_eq!(robust.effects().indirect[0], 0.2, epsilon = 1e-8);

    let run = |fit: &MediationFit| {
        run_bootstrap_test_with_engine(
            SequentialEngine,
            fit,
            Alternative::TwoSided,
            400,
            0.95,
            IntervalType::Percentile,
            Some(2024),
        )
        .unwrap()
    };
    let standard = run(&ols);
    let fast = run(&robust);

    let ab_standard = standard.indirect[0].estimate.unwrap();
    let ab_fast = fast.indirect[0].estimate.unwrap();
    assert!((ab_standard - 0.2).abs() < 0.01);
    assert_relative_eq!(ab_standard, ab_fast, epsilon = 1e-8);

    let c_prime = fast.replicates.column_index("c'").unwrap();
    assert!((fast.replicates.column_mean(c_prime).unwrap() - 0.3).abs() < 0.01);

    for i in 0..standard.replicates.n_rows() {
        for (s, f) in standard.replicates.row(i).iter().zip(fast.replicates.row(i)) {
            assert_relative_eq!(*s, *f, epsilon = 1e-8);
        }
    }
}

#[test]
fn every_replicate_satisfies_total_effect_identity() {
    let data = simulate(80, &[0.6], &[0.5], 0.2, 7);
    let terms = MediationTerms::new("x", "y", &["m1"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::robust_regression()).unwrap();
    let result = run_bootstrap_test_with_engine(
        SequentialEngine,
        &fit,
        Alternative::TwoSided,
        200,
        0.9,
        IntervalType::Percentile,
        Some(5),
    )
    .unwrap();
    let layout = fit.layout();
    for i in 0..result.replicates.n_rows() {
        let row = result.replicates.row(i);
        if row.iter().all(|v| v.is_finite()) {
            assert_relative_eq!(row[layout.total()], row[0] + row[layout.direct()], epsilon = 1e-10);
            assert_relative_eq!(row[0], row[layout.a(0)] * row[layout.b(0)], epsilon = 1e-12);
        }
    }
}

#[test]
fn two_mediators_report_total_then_each_mediator() {
    let data = simulate(120, &[0.5, -0.4], &[0.6, 0.3], 0.1, 11);
    let terms = MediationTerms::new("x", "y", &["m1", "m2"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::least_squares()).unwrap();
    let result = run_bootstrap_test_with_engine(
        SequentialEngine,
        &fit,
        Alternative::TwoSided,
        300,
        0.95,
        IntervalType::Percentile,
        Some(99),
    )
    .unwrap();

    let labels: Vec<&str> = result.indirect.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["Total", "m1", "m2"]);

    let total = result.indirect[0].estimate.unwrap();
    let sum = result.indirect[1].estimate.unwrap() + result.indirect[2].estimate.unwrap();
    assert_relative_eq!(total, sum, epsilon = 1e-10);

    for i in 0..result.replicates.n_rows() {
        let row = result.replicates.row(i);
        assert_relative_eq!(row[0], row[1] + row[2], epsilon = 1e-12);
    }
    assert!(result.indirect.iter().all(|e| e.interval.is_some()));
}

#[test]
fn too_few_weighted_observations_give_missing_estimate() {
    let data = simulate(60, &[0.5], &[0.5], 0.0, 3);
    let terms = MediationTerms::new("x", "y", &["m1"]);
    let mut fit = fit_mediation(&data, &terms, &FitOptions::robust_regression()).unwrap();

    if let FittedModel::Regression { outcome, .. } = &mut fit.model {
        let robustness = outcome.fit.robustness.as_mut().unwrap();
        for (i, w) in robustness.weights.values.iter_mut().enumerate() {
            if i >= 2 {
                *w = 0.0;
            }
        }
    }

    let result = run_bootstrap_test_with_engine(
        SequentialEngine,
        &fit,
        Alternative::TwoSided,
        100,
        0.95,
        IntervalType::Percentile,
        Some(1),
    )
    .unwrap();
    let ab = &result.indirect[0];
    assert_eq!(ab.estimate, None);
    assert_eq!(ab.interval, None);
    assert_eq!(ab.n_valid, 0);
    assert_eq!(result.p_values(4), vec![None]);

    // the mediator regression is unaffected
    let a = result.replicates.column_index("a").unwrap();
    assert_eq!(result.replicates.valid_count(a), 100);
    assert!(result.to_string().contains("no valid replicates"));
}

#[test]
fn out_of_range_level_falls_back_with_warning() {
    let data = simulate(50, &[0.5], &[0.5], 0.0, 21);
    let terms = MediationTerms::new("x", "y", &["m1"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::least_squares()).unwrap();
    let options = TestOptions::bootstrap().with_resamples(100).with_seed(4).with_level(1.5);
    let result = test_mediation_with_engine(SequentialEngine, &fit, &options).unwrap();
    assert_eq!(
        result.warnings(),
        &[Warning::LevelOutOfRange {
            requested: 1.5,
            used: 0.95
        }]
    );
    let reference = test_mediation_with_engine(
        SequentialEngine,
        &fit,
        &options.with_level(0.95),
    )
    .unwrap();
    assert_eq!(
        result.as_bootstrap().unwrap().indirect,
        reference.as_bootstrap().unwrap().indirect
    );
}

#[test]
fn sobel_with_several_mediators_runs_bootstrap() {
    let data = simulate(60, &[0.5, 0.5], &[0.4, 0.4], 0.0, 8);
    let terms = MediationTerms::new("x", "y", &["m1", "m2"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::least_squares()).unwrap();
    let options = TestOptions::sobel().with_resamples(50).with_seed(2);
    let result = test_mediation_with_engine(SequentialEngine, &fit, &options).unwrap();
    assert!(result.as_bootstrap().is_some());
    assert_eq!(result.warnings(), &[Warning::SobelFallback { n_mediators: 2 }]);
}

#[test]
fn sobel_with_one_mediator() {
    let data = simulate(100, &[0.6], &[0.5], 0.1, 13);
    let terms = MediationTerms::new("x", "y", &["m1"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::robust_regression()).unwrap();
    let result = test_mediation_with_engine(SequentialEngine, &fit, &TestOptions::sobel()).unwrap();
    let sobel = result.as_sobel().unwrap();
    assert!(result.warnings().is_empty());
    assert!(sobel.se > 0.0);
    assert!(sobel.p_value < 0.01);

    let less = robust_mediation::sobel_test(&fit, Alternative::Less).unwrap();
    assert!(less.p_value > 0.99);
}

#[test]
fn robust_covariance_bootstrap_resists_outliers() {
    let clean = simulate(100, &[0.5], &[0.5], 0.0, 17);
    let data = contaminate(&clean, "y", 5, 50.0);
    let terms = MediationTerms::new("x", "y", &["m1"]);

    let huber = fit_mediation(&data, &terms, &FitOptions::covariance(true)).unwrap();
    let result = run_bootstrap_test_with_engine(
        SequentialEngine,
        &huber,
        Alternative::Greater,
        300,
        0.95,
        IntervalType::Percentile,
        Some(31),
    )
    .unwrap();
    let ab = &result.indirect[0];
    assert_eq!(ab.label, "m1");
    assert!(ab.n_valid > 290);
    let ci = ab.interval.unwrap();
    assert_eq!(ci.upper, f64::INFINITY);
    assert!(ab.estimate.unwrap().is_finite());
}

#[test]
fn median_regression_bootstrap() {
    let data = simulate(80, &[0.7], &[0.5], 0.2, 23);
    let terms = MediationTerms::new("x", "y", &["m1"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::median_regression()).unwrap();
    let result = run_bootstrap_test_with_engine(
        SequentialEngine,
        &fit,
        Alternative::TwoSided,
        150,
        0.95,
        IntervalType::Bca,
        Some(9),
    )
    .unwrap();
    let ab = &result.indirect[0];
    assert_eq!(ab.n_valid, 150);
    let ci = ab.interval.unwrap();
    assert!(ci.lower < ci.upper);
    assert!(ci.lower > 0.0);
}

#[test]
fn results_are_reproducible_for_a_seed() {
    let data = simulate(40, &[0.5], &[0.5], 0.0, 1);
    let terms = MediationTerms::new("x", "y", &["m1"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::least_squares()).unwrap();
    let options = TestOptions::bootstrap().with_resamples(100).with_seed(77);
    let first = test_mediation_with_engine(SequentialEngine, &fit, &options).unwrap();
    let second = robust_mediation::test_mediation(&fit, &options).unwrap();
    assert_eq!(
        first.as_bootstrap().unwrap().replicates,
        second.as_bootstrap().unwrap().replicates
    );
}
