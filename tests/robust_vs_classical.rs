//! Robust and classical mediation tests on contaminated data

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use robust_mediation_stats::prelude::*;
use robust_mediation_stats::robust_core::SequentialEngine;
use robust_mediation_stats::robust_mediation::test_mediation_with_engine;

fn contaminated(n: usize, outliers: usize, seed: u64) -> DataMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let x: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();
    let m: Vec<f64> = x.iter().map(|xi| 0.6 * xi + normal.sample(&mut rng)).collect();
    let mut y: Vec<f64> = x
        .iter()
        .zip(&m)
        .map(|(xi, mi)| 0.5 * mi + 0.2 * xi + normal.sample(&mut rng))
        .collect();
    // outliers with large x, small y pull the least-squares b towards zero
    for i in 0..outliers {
        y[i] = -25.0 * m[i].signum();
    }
    DataMatrix::from_columns(vec![("x", x), ("m", m), ("y", y)]).unwrap()
}

fn indirect(fit: &MediationFit) -> f64 {
    let options = TestOptions::bootstrap().with_resamples(300).with_seed(12);
    let result = test_mediation_with_engine(SequentialEngine, fit, &options).unwrap();
    result.as_bootstrap().unwrap().indirect[0].estimate.unwrap()
}

#[test]
fn robust_bootstrap_recovers_indirect_effect_under_contamination() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let data = contaminated(200, 10, 42);
    let terms = MediationTerms::new("x", "y", &["m"]);

    let ols = fit_mediation(&data, &terms, &FitOptions::least_squares()).unwrap();
    let robust = fit_mediation(&data, &terms, &FitOptions::robust_regression()).unwrap();

    let truth = 0.6 * 0.5;
    let ab_ols = indirect(&ols);
    let ab_robust = indirect(&robust);
    assert!((ab_robust - truth).abs() < (ab_ols - truth).abs());
    assert!((ab_robust - truth).abs() < 0.12);
}

#[test]
fn summaries_render() {
    let data = contaminated(80, 0, 5);
    let terms = MediationTerms::new("x", "y", &["m"]);
    let fit = fit_mediation(&data, &terms, &FitOptions::robust_regression()).unwrap();
    let text = fit.to_string();
    assert!(text.contains("robust regression"));
    assert!(text.contains("c'"));

    let options = TestOptions::bootstrap()
        .with_resamples(100)
        .with_seed(3)
        .with_interval_type(IntervalType::Bca)
        .with_alternative(Alternative::Less);
    let result = test_mediation_with_engine(SequentialEngine, &fit, &options).unwrap();
    let text = result.to_string();
    assert!(text.contains("BCa") || text.contains("bca"));
    assert!(text.contains("alternative"));

    let sobel = test_mediation(&fit, &TestOptions::sobel()).unwrap();
    assert!(sobel.to_string().contains("Sobel"));
}
