//! Location and scatter estimation
//!
//! Two estimators of the joint center and covariance of the rows of a data
//! matrix:
//!
//! * [`MaximumLikelihood`]: sample mean and covariance with divisor `n`
//! * [`HuberScatter`]: Huber-type M-estimator of location and scatter. With
//!   `r² = χ²_p(prob)` and Mahalanobis distances `dᵢ`, each observation gets
//!   weight `wᵢ = min(1, r/dᵢ)`, and the iteration
//!
//!   μ = Σ wᵢ xᵢ / Σ wᵢ
//!
//!   Σ = Σ wᵢ² (xᵢ - μ)(xᵢ - μ)ᵀ / (n τ)
//!
//!   runs to a fixed point. The consistency factor
//!   `τ = (p F_{p+2}(r²) + r²(1 - prob)) / p` makes Σ consistent at the
//!   normal model.

use crate::traits::ScatterEstimator;
use crate::types::Weights;
use nalgebra::{DMatrix, DVector};
use robust_core::math::distributions::chi_squared;
use robust_core::math::linalg::invert_spd;
use robust_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// A fitted location/scatter estimate
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterFit {
    pub center: DVector<f64>,
    pub cov: DMatrix<f64>,
    /// Per-observation weights, absent for the maximum-likelihood estimate
    pub weights: Option<Weights>,
    /// Consistency factor τ (1 for maximum likelihood)
    pub consistency: f64,
    pub n_obs: usize,
    pub converged: bool,
    pub iterations: usize,
}

impl ScatterFit {
    /// Transform `data` so its plain covariance reproduces this estimate
    ///
    /// Rows become `wᵢ(xᵢ - μ)/√τ`. Without weights the data is returned
    /// unchanged.
    pub fn clean(&self, data: &DMatrix<f64>) -> DMatrix<f64> {
        match &self.weights {
            None => data.clone(),
            Some(w) => {
                let root_tau = self.consistency.sqrt();
                DMatrix::from_fn(data.nrows(), data.ncols(), |i, j| {
                    w.values[i] * (data[(i, j)] - self.center[j]) / root_tau
                })
            }
        }
    }

    /// Covariance entry by position
    pub fn entry(&self, i: usize, j: usize) -> f64 {
        self.cov[(i, j)]
    }
}

/// Sample mean and covariance with divisor `n`
pub fn ml_covariance(data: &DMatrix<f64>) -> Result<(DVector<f64>, DMatrix<f64>)> {
    let (n, p) = data.shape();
    if n < 2 {
        return Err(Error::InsufficientData {
            expected: 2,
            actual: n,
        });
    }
    let center = DVector::from_fn(p, |j, _| data.column(j).sum() / n as f64);
    let mut cov = DMatrix::zeros(p, p);
    for i in 0..n {
        for j in 0..p {
            let dj = data[(i, j)] - center[j];
            for k in j..p {
                cov[(j, k)] += dj * (data[(i, k)] - center[k]);
            }
        }
    }
    for j in 0..p {
        for k in j..p {
            cov[(j, k)] /= n as f64;
            cov[(k, j)] = cov[(j, k)];
        }
    }
    Ok((center, cov))
}

/// Classical maximum-likelihood estimator of location and scatter
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumLikelihood;

impl ScatterEstimator for MaximumLikelihood {
    fn estimate(&self, data: &DMatrix<f64>) -> Result<ScatterFit> {
        let (center, cov) = ml_covariance(data)?;
        Ok(ScatterFit {
            center,
            cov,
            weights: None,
            consistency: 1.0,
            n_obs: data.nrows(),
            converged: true,
            iterations: 0,
        })
    }

    fn name(&self) -> &'static str {
        "maximum likelihood"
    }

    fn is_robust(&self) -> bool {
        false
    }
}

/// Control parameters for the Huber scatter estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HuberControl {
    /// Probability of the χ² quantile defining the weight cutoff
    pub prob: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for HuberControl {
    fn default() -> Self {
        Self {
            prob: 0.95,
            max_iter: 100,
            tolerance: 1e-7,
        }
    }
}

impl HuberControl {
    /// Reject settings the estimator cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.prob > 0.0 && self.prob < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "Huber cutoff probability must be in (0, 1), got {}",
                self.prob
            )));
        }
        if self.max_iter == 0 || !(self.tolerance > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "Huber scatter needs max_iter > 0 and tolerance > 0, got {} and {}",
                self.max_iter, self.tolerance
            )));
        }
        Ok(())
    }

    /// Weight cutoff `r` and consistency factor `τ` for dimension `p`
    pub fn cutoff(&self, p: usize) -> Result<(f64, f64)> {
        let df = p as f64;
        let r2 = chi_squared::quantile(self.prob, df)?;
        let tau = (df * chi_squared::cdf(r2, df + 2.0)? + r2 * (1.0 - self.prob)) / df;
        Ok((r2.sqrt(), tau))
    }
}

/// Huber M-estimator of location and scatter
#[derive(Debug, Clone, Copy, Default)]
pub struct HuberScatter {
    pub control: HuberControl,
}

impl HuberScatter {
    /// Create an estimator with the given control
    pub fn new(control: HuberControl) -> Self {
        Self { control }
    }
}

fn huber_weights(data: &DMatrix<f64>, center: &DVector<f64>, cov_inv: &DMatrix<f64>, r: f64) -> DVector<f64> {
    DVector::from_fn(data.nrows(), |i, _| {
        let d = (data.row(i).transpose() - center).clone_owned();
        let dist = (d.transpose() * cov_inv * &d)[(0, 0)].max(0.0).sqrt();
        if dist <= r {
            1.0
        } else {
            r / dist
        }
    })
}

impl ScatterEstimator for HuberScatter {
    #[instrument(skip(self, data), fields(n = data.nrows(), p = data.ncols()))]
    fn estimate(&self, data: &DMatrix<f64>) -> Result<ScatterFit> {
        self.control.validate()?;
        let (n, p) = data.shape();
        if n <= p {
            return Err(Error::InsufficientData {
                expected: p + 1,
                actual: n,
            });
        }
        let (r, tau) = self.control.cutoff(p)?;
        let (mut center, mut cov) = ml_covariance(data)?;
        let mut weights = DVector::from_element(n, 1.0);
        let mut converged = false;
        let mut iterations = 0;

        for iter in 1..=self.control.max_iter {
            iterations = iter;
            let cov_inv = invert_spd(&cov, "scatter matrix")?;
            weights = huber_weights(data, &center, &cov_inv, r);

            let total: f64 = weights.sum();
            let next_center = DVector::from_fn(p, |j, _| {
                data.column(j).dot(&weights) / total
            });
            let mut next_cov = DMatrix::zeros(p, p);
            for i in 0..n {
                let d = (data.row(i).transpose() - &next_center) * weights[i];
                next_cov += &d * d.transpose();
            }
            next_cov /= n as f64 * tau;

            let change = (&next_center - &center)
                .amax()
                .max((&next_cov - &cov).amax());
            let size = next_center.amax().max(next_cov.amax()).max(1.0);
            center = next_center;
            cov = next_cov;
            if change <= self.control.tolerance * size {
                converged = true;
                break;
            }
        }

        if converged {
            // Weights consistent with the final estimate
            let cov_inv = invert_spd(&cov, "scatter matrix")?;
            weights = huber_weights(data, &center, &cov_inv, r);
            debug!(iterations, tau, "Huber scatter converged");
        } else {
            warn!(iterations, "Huber scatter did not converge; using last iterate");
        }

        Ok(ScatterFit {
            center,
            cov,
            weights: Some(Weights::consistency(weights)),
            consistency: tau,
            n_obs: n,
            converged,
            iterations,
        })
    }

    fn name(&self) -> &'static str {
        "Huber M-estimator"
    }

    fn is_robust(&self) -> bool {
        true
    }
}
