//! Regression M-estimation by iteratively reweighted least squares
//!
//! The fit starts from the median regression solution, fixes the residual
//! scale at the normalized MAD of the starting residuals, and then
//! alternates between computing robustness weights `w = ψ(r/s)/(r/s)` and
//! solving the weighted least-squares problem until the coefficients stop
//! moving.

use crate::median::{MedianControl, MedianRegression};
use crate::ols::{residuals, wls_coefficients};
use crate::psi::{standardize, PsiControl};
use crate::traits::RegressionEstimator;
use crate::types::{RegressionFit, RegressionMethod, RobustnessInfo, Weights};
use nalgebra::{DMatrix, DVector};
use robust_core::math::linalg::{invert_spd, weighted_gram};
use robust_core::math::order::mad_about_zero;
use robust_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Scale below which (relative to the response) the start is an exact fit
const EXACT_FIT_TOLERANCE: f64 = 1e-9;

/// Control parameters for robust regression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobustControl {
    pub psi: PsiControl,
    /// Maximum IRLS iterations
    pub max_iter: usize,
    /// Relative change in coefficients at which IRLS stops
    pub tolerance: f64,
}

impl Default for RobustControl {
    fn default() -> Self {
        Self {
            psi: PsiControl::default(),
            max_iter: 100,
            tolerance: 1e-7,
        }
    }
}

impl RobustControl {
    /// Replace the psi function
    pub fn with_psi(mut self, psi: PsiControl) -> Self {
        self.psi = psi;
        self
    }

    /// Reject settings IRLS cannot run with
    pub fn validate(&self) -> Result<()> {
        self.psi.validate()?;
        if self.max_iter == 0 || !(self.tolerance > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "robust regression needs max_iter > 0 and tolerance > 0, got {} and {}",
                self.max_iter, self.tolerance
            )));
        }
        Ok(())
    }
}

/// Regression M-estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct MEstimator {
    pub control: RobustControl,
    /// Control of the median regression used as starting point
    pub start: MedianControl,
}

struct Solution {
    coefficients: DVector<f64>,
    scale: f64,
    iterations: usize,
    converged: bool,
}

impl MEstimator {
    /// Create an estimator with the given control
    pub fn new(control: RobustControl) -> Self {
        Self {
            control,
            start: MedianControl::default(),
        }
    }

    fn solve(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<Solution> {
        self.control.validate()?;
        let start = MedianRegression::new(self.start).coefficients(x, y)?;
        let r0 = residuals(x, y, &start);
        let scale = mad_about_zero(r0.as_slice());

        if scale <= EXACT_FIT_TOLERANCE * y.amax().max(1.0) {
            debug!(scale, "starting fit is exact; skipping reweighting");
            return Ok(Solution {
                coefficients: start,
                scale: 0.0,
                iterations: 0,
                converged: true,
            });
        }

        let psi = self.control.psi;
        let mut beta = start;
        for iter in 1..=self.control.max_iter {
            let u = residuals(x, y, &beta) / scale;
            let w: Vec<f64> = u.iter().map(|&ui| psi.weight(ui)).collect();
            let next = wls_coefficients(x, y, &w)?;
            let change = (&next - &beta).amax();
            let size = next.amax().max(1.0);
            beta = next;
            if change <= self.control.tolerance * size {
                return Ok(Solution {
                    coefficients: beta,
                    scale,
                    iterations: iter,
                    converged: true,
                });
            }
        }
        Ok(Solution {
            coefficients: beta,
            scale,
            iterations: self.control.max_iter,
            converged: false,
        })
    }
}

impl RegressionEstimator for MEstimator {
    #[instrument(skip(self, x, y), fields(n = x.nrows(), p = x.ncols(), psi = self.control.psi.family.name()))]
    fn fit(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<RegressionFit> {
        let solution = self.solve(x, y)?;
        if !solution.converged {
            warn!(
                iterations = solution.iterations,
                "robust regression did not converge; using last iterate"
            );
        }
        let psi = self.control.psi;
        let n = x.nrows() as f64;
        let residuals = residuals(x, y, &solution.coefficients);
        let u = standardize(&residuals, solution.scale);

        let weights = if solution.scale > 0.0 {
            u.map(|ui| psi.weight(ui))
        } else {
            DVector::from_element(x.nrows(), 1.0)
        };

        // Sandwich: s² E[ψ²] / E[ψ']² (XᵀX)⁻¹
        let gram_inv = invert_spd(&weighted_gram(x, &vec![1.0; x.nrows()]), "X'X")?;
        let mean_psi2 = u.iter().map(|&ui| psi.psi(ui).powi(2)).sum::<f64>() / n;
        let mean_dpsi = u.iter().map(|&ui| psi.derivative(ui)).sum::<f64>() / n;
        let factor = if mean_dpsi > 0.0 {
            solution.scale * solution.scale * mean_psi2 / (mean_dpsi * mean_dpsi)
        } else {
            f64::NAN
        };
        let std_errors = DVector::from_fn(x.ncols(), |j, _| (factor * gram_inv[(j, j)]).sqrt());

        debug!(
            iterations = solution.iterations,
            scale = solution.scale,
            "robust regression fitted"
        );

        Ok(RegressionFit {
            method: RegressionMethod::MEstimator,
            terms: Vec::new(),
            coefficients: solution.coefficients,
            std_errors,
            residuals,
            scale: solution.scale,
            robustness: Some(RobustnessInfo {
                weights: Weights::robustness(weights),
                psi,
                converged: solution.converged,
                iterations: solution.iterations,
            }),
        })
    }

    fn coefficients(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(self.solve(x, y)?.coefficients)
    }

    fn method(&self) -> RegressionMethod {
        RegressionMethod::MEstimator
    }
}
