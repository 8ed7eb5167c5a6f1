//! Median (least absolute deviations) regression
//!
//! Coefficients minimize `Σ|yᵢ - xᵢβ|`. The L1 problem is solved by
//! iteratively reweighted least squares with weights `1 / max(|rᵢ|, δ)`,
//! started from the least-squares fit.
//!
//! Standard errors assume iid errors: `τ(1-τ) ŝ² (XᵀX)⁻¹` with τ = 0.5,
//! where the sparsity `ŝ = 1/f(0)` is estimated by a difference quotient of
//! residual quantiles over the Hall–Sheather bandwidth.

use crate::ols::{residuals, wls_coefficients};
use crate::traits::RegressionEstimator;
use crate::types::{RegressionFit, RegressionMethod};
use nalgebra::{DMatrix, DVector};
use robust_core::math::distributions::normal;
use robust_core::math::linalg::{invert_spd, weighted_gram};
use robust_core::math::order::{mad_about_zero, quantile_sorted, sorted_finite};
use robust_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const QUANTILE: f64 = 0.5;

/// Iteration control for median regression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedianControl {
    /// Maximum IRLS iterations
    pub max_iter: usize,
    /// Relative change in coefficients at which IRLS stops
    pub tolerance: f64,
    /// Lower bound on `|r|` in the IRLS weights
    pub epsilon: f64,
}

impl Default for MedianControl {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tolerance: 1e-8,
            epsilon: 1e-8,
        }
    }
}

impl MedianControl {
    /// Reject settings IRLS cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter(
                "median regression needs at least one iteration".to_string(),
            ));
        }
        if !(self.tolerance > 0.0 && self.epsilon > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "median regression tolerance {} and epsilon {} must be positive",
                self.tolerance, self.epsilon
            )));
        }
        Ok(())
    }
}

/// Median regression estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianRegression {
    pub control: MedianControl,
}

impl MedianRegression {
    /// Create an estimator with the given control
    pub fn new(control: MedianControl) -> Self {
        Self { control }
    }

    /// Run IRLS, returning coefficients, iterations and the convergence flag
    fn solve(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(DVector<f64>, usize, bool)> {
        let (n, p) = x.shape();
        if n <= p {
            return Err(Error::InsufficientData {
                expected: p + 1,
                actual: n,
            });
        }
        let ones = vec![1.0; n];
        let mut beta = wls_coefficients(x, y, &ones)?;
        let eps = self.control.epsilon;

        for iter in 1..=self.control.max_iter {
            let r = residuals(x, y, &beta);
            let w: Vec<f64> = r.iter().map(|ri| 1.0 / ri.abs().max(eps)).collect();
            let next = wls_coefficients(x, y, &w)?;
            let change = (&next - &beta).amax();
            let size = next.amax().max(1.0);
            beta = next;
            if change <= self.control.tolerance * size {
                return Ok((beta, iter, true));
            }
        }
        Ok((beta, self.control.max_iter, false))
    }
}

/// Hall–Sheather bandwidth for quantile `tau` at 95% confidence
pub fn hall_sheather_bandwidth(n: usize, tau: f64) -> f64 {
    let z = normal::quantile(0.975);
    let q = normal::quantile(tau);
    let f = normal::pdf(q);
    (n as f64).powf(-1.0 / 3.0)
        * z.powf(2.0 / 3.0)
        * (1.5 * f * f / (2.0 * q * q + 1.0)).powf(1.0 / 3.0)
}

/// Sparsity `1/f(F⁻¹(τ))` estimated from residual quantiles
fn sparsity(residuals: &DVector<f64>, tau: f64) -> f64 {
    let sorted = sorted_finite(residuals.as_slice());
    let h = hall_sheather_bandwidth(sorted.len(), tau);
    let lo = (tau - h).max(0.0);
    let hi = (tau + h).min(1.0);
    if hi <= lo {
        return 0.0;
    }
    (quantile_sorted(&sorted, hi) - quantile_sorted(&sorted, lo)) / (hi - lo)
}

impl RegressionEstimator for MedianRegression {
    fn fit(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<RegressionFit> {
        self.control.validate()?;
        let (coefficients, iterations, converged) = self.solve(x, y)?;
        if !converged {
            warn!(
                iterations,
                "median regression did not converge; using last iterate"
            );
        }
        let residuals = residuals(x, y, &coefficients);
        let gram_inv = invert_spd(&weighted_gram(x, &vec![1.0; x.nrows()]), "X'X")?;
        let s = sparsity(&residuals, QUANTILE);
        let factor = QUANTILE * (1.0 - QUANTILE) * s * s;
        let std_errors = DVector::from_fn(x.ncols(), |j, _| (factor * gram_inv[(j, j)]).sqrt());
        debug!(iterations, sparsity = s, "median regression fitted");

        Ok(RegressionFit {
            method: RegressionMethod::Median,
            terms: Vec::new(),
            coefficients,
            std_errors,
            scale: mad_about_zero(residuals.as_slice()),
            residuals,
            robustness: None,
        })
    }

    fn coefficients(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(self.solve(x, y)?.0)
    }

    fn method(&self) -> RegressionMethod {
        RegressionMethod::Median
    }
}
