//! Mediation analysis with fast-and-robust bootstrap and Sobel tests
//!
//! A mediation model explains the effect of `x` on `y` through one or more
//! mediators `m`. This crate fits such models ([`fit_mediation`]) and tests
//! the indirect effect `ab`:
//!
//! - **Bootstrap**: one of four replicate statistics, chosen once per fit
//!   ([`BootstrapStatistic`]): least-squares refits, the fast-and-robust
//!   bootstrap with a precomputed [`correction_matrix`], median-regression
//!   refits, or covariance replicates
//! - **Sobel**: the normal-approximation test for a single mediator
//!
//! # Example
//!
//! ```rust
//! use robust_core::DataMatrix;
//! use robust_mediation::{fit_mediation, test_mediation, FitOptions, MediationTerms, TestOptions};
//!
//! let x: Vec<f64> = (0..60).map(|i| i as f64 / 10.0).collect();
//! let m: Vec<f64> = x.iter().enumerate().map(|(i, v)| 0.5 * v + [0.2, -0.2, 0.1][i % 3]).collect();
//! let y: Vec<f64> = x
//!     .iter()
//!     .zip(&m)
//!     .enumerate()
//!     .map(|(i, (xv, mv))| 0.4 * mv + 0.1 * xv + [-0.1, 0.1][i % 2])
//!     .collect();
//! let data = DataMatrix::from_columns(vec![("x", x), ("m", m), ("y", y)]).unwrap();
//!
//! let fit = fit_mediation(
//!     &data,
//!     &MediationTerms::new("x", "y", &["m"]),
//!     &FitOptions::robust_regression(),
//! )
//! .unwrap();
//! let result = test_mediation(&fit, &TestOptions::bootstrap().with_resamples(200).with_seed(1)).unwrap();
//! let ab = result.as_bootstrap().unwrap().indirect[0].estimate.unwrap();
//! assert!((ab - 0.2).abs() < 0.05);
//! ```

pub mod api;
pub mod bootstrap;
pub mod correction;
pub mod effects;
pub mod fit;
pub mod sobel;
pub mod statistics;
pub mod types;

pub use api::{test_mediation, test_mediation_with_engine, MediationTest, TestOptions, TestType};
pub use bootstrap::{run_bootstrap_test, run_bootstrap_test_with_engine, BootstrapTest, IndirectEffect};
pub use correction::{correction_matrix, CorrectedRegression};
pub use effects::{EffectLayout, Effects, TOTAL_LABEL};
pub use fit::{fit_mediation, FitOptions};
pub use sobel::{sobel_p_value, sobel_test, SobelTest};
pub use statistics::{BootstrapStatistic, CovarianceContext, FastRobustContext, RefitContext};
pub use types::{FitMethod, FittedModel, FittedRegression, MediationFit, MediationTerms};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        fit_mediation, test_mediation, BootstrapTest, FitMethod, FitOptions, MediationFit,
        MediationTerms, MediationTest, SobelTest, TestOptions, TestType,
    };
    pub use robust_confidence::{Alternative, IntervalType};
}
