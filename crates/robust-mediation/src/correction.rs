//! Linear correction for the fast-and-robust bootstrap
//!
//! Refitting an M-estimator on every resample is expensive. Instead, each
//! replicate solves one weighted least-squares problem on the resampled rows
//! with the weights of the original fit held fixed, giving `β*`. The
//! one-step estimate `β*` underestimates the variability of the fully
//! iterated estimator; the correction
//!
//! ```text
//! β̂ + C (β* - β̂),    C = (Xᵀ diag(ψ'(r/s)) X)⁻¹ Xᵀ W X
//! ```
//!
//! restores it. `C` depends only on the original sample, so it is built once
//! and shared by all replicates.

use nalgebra::{DMatrix, DVector};
use robust_core::math::linalg::{invert, weighted_gram};
use robust_core::{DataMatrix, Error, Result};
use robust_regression::psi::{standardize, PsiControl};
use robust_regression::{wls_coefficients, RegressionFit, RegressionModel, Weights};

/// Correction operator `C = (Xᵀ D X)⁻¹ Xᵀ W X` with `D = diag(ψ'(r/s))`
///
/// `XᵀDX` is inverted as a general matrix: for a redescending psi some
/// derivatives are negative and the product need not be positive definite.
pub fn correction_matrix(
    x: &DMatrix<f64>,
    weights: &[f64],
    residuals: &DVector<f64>,
    scale: f64,
    psi: &PsiControl,
) -> Result<DMatrix<f64>> {
    if weights.len() != x.nrows() {
        return Err(Error::size_mismatch(x.nrows(), weights.len(), "robustness weights"));
    }
    if residuals.len() != x.nrows() {
        return Err(Error::size_mismatch(x.nrows(), residuals.len(), "residuals"));
    }
    let u = standardize(residuals, scale);
    let d: Vec<f64> = u.iter().map(|&ui| psi.derivative(ui)).collect();
    let derivative_gram = invert(&weighted_gram(x, &d), "X'diag(psi')X")?;
    Ok(derivative_gram * weighted_gram(x, weights))
}

/// One robust regression prepared for fast-and-robust resampling
#[derive(Debug, Clone)]
pub struct CorrectedRegression {
    model: RegressionModel,
    coefficients: DVector<f64>,
    weights: Weights,
    correction: DMatrix<f64>,
}

impl CorrectedRegression {
    /// Prepare `fit` (an M-estimator fit of `model` on `data`)
    pub fn build(model: &RegressionModel, data: &DataMatrix, fit: &RegressionFit) -> Result<Self> {
        let robustness = fit.robustness.as_ref().ok_or_else(|| {
            Error::UnsupportedConfiguration(
                "fast-and-robust bootstrap needs a fit with robustness weights".to_string(),
            )
        })?;
        let (x, _) = model.design(data);
        let correction = correction_matrix(
            &x,
            robustness.weights.values.as_slice(),
            &fit.residuals,
            fit.scale,
            &robustness.psi,
        )?;
        Ok(Self {
            model: model.clone(),
            coefficients: fit.coefficients.clone(),
            weights: robustness.weights.clone(),
            correction,
        })
    }

    /// The correction operator
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.correction
    }

    /// Coefficients of the original fit
    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    /// Apply the correction to one-step replicate coefficients
    pub fn correct(&self, replicate: &DVector<f64>) -> DVector<f64> {
        &self.coefficients + &self.correction * (replicate - &self.coefficients)
    }

    /// Whether the resampled rows carry enough weighted information
    ///
    /// A replicate needs more distinct positively weighted observations than
    /// there are coefficients.
    pub fn is_estimable(&self, indices: &[usize]) -> bool {
        self.weights.count_positive_distinct(indices) > self.model.n_coefficients()
    }

    /// Corrected coefficients on the rows at `indices`
    ///
    /// Returns `None` if the replicate is not estimable or its weighted
    /// Gram matrix is singular.
    pub fn replicate(&self, data: &DataMatrix, indices: &[usize]) -> Option<DVector<f64>> {
        if !self.is_estimable(indices) {
            return None;
        }
        let (x, y) = self.model.design_rows(data, indices);
        let w: Vec<f64> = indices.iter().map(|&i| self.weights.values[i]).collect();
        let naive = wls_coefficients(&x, &y, &w).ok()?;
        Some(self.correct(&naive))
    }

    /// Number of coefficients
    pub fn n_coefficients(&self) -> usize {
        self.model.n_coefficients()
    }
}
