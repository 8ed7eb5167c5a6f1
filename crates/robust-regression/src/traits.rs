//! Estimator traits
//!
//! Regression and scatter estimators are small configuration objects that
//! are passed by reference into whatever needs to fit a model: the initial
//! mediation fit, or a bootstrap replicate that refits on resampled rows.

use crate::covariance::ScatterFit;
use crate::types::{RegressionFit, RegressionMethod};
use nalgebra::{DMatrix, DVector};
use robust_core::Result;

/// Estimator of linear regression coefficients
pub trait RegressionEstimator: Send + Sync {
    /// Fit the model, including standard errors and residual scale
    fn fit(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<RegressionFit>;

    /// Coefficients only
    ///
    /// Bootstrap replicates need nothing else, so implementations override
    /// this to skip inference.
    fn coefficients(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(self.fit(x, y)?.coefficients)
    }

    /// Method tag of the fits this estimator produces
    fn method(&self) -> RegressionMethod;

    /// Whether the estimator downweights outlying observations
    fn is_robust(&self) -> bool {
        !matches!(self.method(), RegressionMethod::LeastSquares)
    }
}

/// Estimator of multivariate location and scatter
pub trait ScatterEstimator: Send + Sync {
    /// Estimate center and scatter of the rows of `data`
    fn estimate(&self, data: &DMatrix<f64>) -> Result<ScatterFit>;

    /// Name of the estimator
    fn name(&self) -> &'static str;

    /// Whether the estimator downweights outlying observations
    fn is_robust(&self) -> bool;
}
