//! Shared utilities for integration tests

#![allow(dead_code)]

pub use approx::assert_relative_eq;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use robust_core::DataMatrix;

pub const EPSILON: f64 = 1e-10;

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `x_i = i - (n-1)/2`, `m = 0.5x + e` with `e` repeating `+1, -1, -1, +1`,
/// `y = 0.4m + 0.1x` without noise
///
/// `e` is orthogonal to the intercept and to `x` whenever `n` is a multiple of
/// four, so the least-squares paths are exactly `a = 0.5`, `b = 0.4` and
/// `c = 0.1`.
pub fn noiseless_single_mediator(n: usize) -> DataMatrix {
    let centre = (n as f64 - 1.0) / 2.0;
    let x: Vec<f64> = (0..n).map(|i| i as f64 - centre).collect();
    let m: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, v)| 0.5 * v + [1.0, -1.0, -1.0, 1.0][i % 4])
        .collect();
    let y: Vec<f64> = x.iter().zip(&m).map(|(xv, mv)| 0.4 * mv + 0.1 * xv).collect();
    DataMatrix::from_columns(vec![("x", x), ("m", m), ("y", y)]).unwrap()
}

/// Gaussian mediation data with paths `a` per mediator, `b` per mediator
/// and direct effect `c`
pub fn simulate(n: usize, a: &[f64], b: &[f64], c: f64, seed: u64) -> DataMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let x: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();
    let mediators: Vec<Vec<f64>> = a
        .iter()
        .map(|aj| x.iter().map(|xi| aj * xi + normal.sample(&mut rng)).collect())
        .collect();
    let y: Vec<f64> = (0..n)
        .map(|i| {
            let through: f64 = mediators.iter().zip(b).map(|(m, bj)| bj * m[i]).sum();
            through + c * x[i] + normal.sample(&mut rng)
        })
        .collect();

    let mut columns = vec![("x".to_string(), x), ("y".to_string(), y)];
    for (j, m) in mediators.into_iter().enumerate() {
        columns.push((format!("m{}", j + 1), m));
    }
    DataMatrix::from_columns(columns).unwrap()
}

/// Replace `count` observations of `column` with a gross outlier
pub fn contaminate(data: &DataMatrix, column: &str, count: usize, value: f64) -> DataMatrix {
    let columns = data
        .names()
        .iter()
        .map(|name| {
            let mut values = data.column(name).unwrap();
            if name == column {
                for v in values.iter_mut().take(count) {
                    *v = value;
                }
            }
            (name.clone(), values)
        })
        .collect();
    DataMatrix::from_columns(columns).unwrap()
}
