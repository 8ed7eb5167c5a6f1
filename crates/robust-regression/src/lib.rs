//! Linear regression and scatter estimators for robust mediation analysis
//!
//! This crate fits the models a mediation analysis is built from:
//!
//! - [`OrdinaryLeastSquares`] and weighted least squares ([`wls_coefficients`])
//! - [`MEstimator`]: robust regression by IRLS with a bounded [`PsiControl`]
//! - [`MedianRegression`]: least absolute deviations
//! - [`MaximumLikelihood`] and [`HuberScatter`] estimates of location and scatter
//!
//! Every regression fit exposes coefficients, residuals and a residual
//! scale. Robust fits additionally carry typed per-observation
//! [`Weights`] and the psi function that produced them.
//!
//! # Example
//!
//! ```rust
//! use robust_regression::{MEstimator, RegressionEstimator};
//! use nalgebra::{DMatrix, DVector};
//!
//! let x = DMatrix::from_fn(20, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
//! let mut y = DVector::from_fn(20, |i, _| 1.0 + 0.5 * i as f64 + if i % 2 == 0 { 0.1 } else { -0.1 });
//! y[3] = 40.0;
//!
//! let fit = MEstimator::default().fit(&x, &y).unwrap();
//! assert!((fit.coefficients[1] - 0.5).abs() < 0.05);
//! assert_eq!(fit.robustness_weights().unwrap().values[3], 0.0);
//! ```

pub mod covariance;
pub mod design;
pub mod m_estimator;
pub mod median;
pub mod ols;
pub mod psi;
pub mod traits;
pub mod types;

pub use covariance::{ml_covariance, HuberControl, HuberScatter, MaximumLikelihood, ScatterFit};
pub use design::{RegressionModel, INTERCEPT};
pub use m_estimator::{MEstimator, RobustControl};
pub use median::{MedianControl, MedianRegression};
pub use ols::{wls_coefficients, OrdinaryLeastSquares};
pub use psi::{PsiControl, PsiFamily};
pub use traits::{RegressionEstimator, ScatterEstimator};
pub use types::{RegressionFit, RegressionMethod, RobustnessInfo, WeightKind, Weights};
