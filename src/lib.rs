//! Robust mediation analysis
//!
//! This crate re-exports the workspace members:
//!
//! - [`robust_core`]: errors, execution engines, numerics and the data matrix
//! - [`robust_regression`]: least squares, M-estimation, median regression and
//!   scatter estimators
//! - [`robust_confidence`]: bootstrap resampling, percentile and BCa intervals
//! - [`robust_mediation`]: fitting mediation models, the fast-and-robust bootstrap
//!   test and Sobel's test
//!
//! # Example
//!
//! ```rust
//! use robust_mediation_stats::prelude::*;
//!
//! let x: Vec<f64> = (0..48).map(|i| i as f64 - 23.5).collect();
//! let m: Vec<f64> = x.iter().enumerate().map(|(i, v)| 0.5 * v + [1.0, -1.0, -1.0, 1.0][i % 4]).collect();
//! let y: Vec<f64> = x.iter().zip(&m).map(|(xv, mv)| 0.4 * mv + 0.1 * xv).collect();
//! let data = DataMatrix::from_columns(vec![("x", x), ("m", m), ("y", y)]).unwrap();
//!
//! let fit = fit_mediation(&data, &MediationTerms::new("x", "y", &["m"]), &FitOptions::least_squares()).unwrap();
//! let sobel = test_mediation(&fit, &TestOptions::sobel()).unwrap();
//! assert!((sobel.as_sobel().unwrap().indirect - 0.2).abs() < 1e-9);
//! ```

pub use robust_confidence;
pub use robust_core;
pub use robust_mediation;
pub use robust_regression;

/// Prelude module for convenient imports
pub mod prelude {
    pub use robust_confidence::{Alternative, ConfidenceInterval, ConfidenceLevel, IntervalType};
    pub use robust_core::{DataMatrix, Error, Result, Warning};
    pub use robust_mediation::prelude::*;
    pub use robust_regression::{PsiControl, RobustControl};
}
