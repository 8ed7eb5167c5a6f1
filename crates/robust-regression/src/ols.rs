//! Ordinary and weighted least squares

use crate::traits::RegressionEstimator;
use crate::types::{RegressionFit, RegressionMethod};
use nalgebra::{DMatrix, DVector};
use robust_core::math::linalg::{invert_spd, solve_spd, weighted_cross, weighted_gram};
use robust_core::{Error, Result};

/// Weighted least squares coefficients `(XᵀWX)⁻¹XᵀWy`
///
/// Fails with [`Error::Singular`] when the weighted Gram matrix is not
/// numerically positive definite.
pub fn wls_coefficients(x: &DMatrix<f64>, y: &DVector<f64>, w: &[f64]) -> Result<DVector<f64>> {
    if x.nrows() != y.len() {
        return Err(Error::size_mismatch(x.nrows(), y.len(), "response"));
    }
    if w.len() != y.len() {
        return Err(Error::size_mismatch(y.len(), w.len(), "weights"));
    }
    let gram = weighted_gram(x, w);
    let cross = weighted_cross(x, w, y);
    solve_spd(&gram, &cross, "X'WX")
}

/// Residuals `y - Xβ`
pub fn residuals(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> DVector<f64> {
    y - x * beta
}

/// Ordinary least squares with classical standard errors
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

impl OrdinaryLeastSquares {
    /// Create a new least-squares estimator
    pub fn new() -> Self {
        Self
    }
}

impl RegressionEstimator for OrdinaryLeastSquares {
    fn fit(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<RegressionFit> {
        let (n, p) = x.shape();
        if n <= p {
            return Err(Error::InsufficientData {
                expected: p + 1,
                actual: n,
            });
        }
        let ones = vec![1.0; n];
        let gram_inv = invert_spd(&weighted_gram(x, &ones), "X'X")?;
        let coefficients = &gram_inv * weighted_cross(x, &ones, y);
        let residuals = residuals(x, y, &coefficients);
        let sigma2 = residuals.norm_squared() / (n - p) as f64;
        let std_errors = DVector::from_fn(p, |j, _| (sigma2 * gram_inv[(j, j)]).sqrt());

        Ok(RegressionFit {
            method: RegressionMethod::LeastSquares,
            terms: Vec::new(),
            coefficients,
            std_errors,
            residuals,
            scale: sigma2.sqrt(),
            robustness: None,
        })
    }

    fn coefficients(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
        let ones = vec![1.0; x.nrows()];
        wls_coefficients(x, y, &ones)
    }

    fn method(&self) -> RegressionMethod {
        RegressionMethod::LeastSquares
    }
}
