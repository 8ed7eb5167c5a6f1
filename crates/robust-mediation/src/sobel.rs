//! Sobel's test of a single indirect effect
//!
//! `z = ab / √(b² σ_a² + a² σ_b²)` compared with the standard normal
//! distribution. The path standard errors come from the coefficient
//! standard errors of the two regressions, or for a covariance fit from the
//! normal-theory variances of the slopes implied by the scatter matrix.

use crate::effects::{COV_M, COV_X, COV_Y};
use crate::types::{FittedModel, MediationFit};
use nalgebra::{Matrix2, Vector2};
use robust_confidence::Alternative;
use robust_core::math::distributions::normal;
use robust_core::{Error, Result};
use robust_regression::ScatterFit;
use std::fmt;
use tracing::instrument;

/// Result of Sobel's test
#[derive(Debug, Clone)]
pub struct SobelTest {
    /// Indirect effect `ab`
    pub indirect: f64,
    /// Standard error of `ab`
    pub se: f64,
    /// `ab / se`
    pub statistic: f64,
    pub p_value: f64,
    pub alternative: Alternative,
    pub fit: MediationFit,
}

impl fmt::Display for SobelTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sobel test for indirect effect via {}", self.fit.description())?;
        writeln!(
            f,
            "  ab = {:.6}, se = {:.6}, z = {:.4}, p-value = {:.4} ({})",
            self.indirect, self.se, self.statistic, self.p_value, self.alternative
        )
    }
}

/// p-value of a standard normal test statistic
pub fn sobel_p_value(z: f64, alternative: Alternative) -> f64 {
    match alternative {
        Alternative::TwoSided => 2.0 * normal::sf(z.abs()),
        Alternative::Less => normal::cdf(z),
        Alternative::Greater => normal::sf(z),
    }
}

/// Paths `(a, se_a, b, se_b)` of a covariance fit
fn covariance_paths(scatter: &ScatterFit) -> Result<(f64, f64, f64, f64)> {
    let s = |i, j| scatter.entry(i, j);
    let n = scatter.n_obs as f64;
    let (sxx, smm, syy) = (s(COV_X, COV_X), s(COV_M, COV_M), s(COV_Y, COV_Y));
    let (smx, syx, sym) = (s(COV_M, COV_X), s(COV_Y, COV_X), s(COV_Y, COV_M));

    let a = smx / sxx;
    let residual_m = smm - smx * smx / sxx;
    if !(sxx > 0.0 && residual_m > 0.0) {
        return Err(Error::Singular(
            "scatter matrix of (x, m) is not positive definite".to_string(),
        ));
    }
    let se_a = (residual_m / (n * sxx)).sqrt();

    // y regressed on (x, m)
    let gram = Matrix2::new(sxx, smx, smx, smm);
    let cross = Vector2::new(syx, sym);
    let gram_inv = gram
        .try_inverse()
        .ok_or_else(|| Error::Singular("scatter matrix of (x, m)".to_string()))?;
    let slopes = gram_inv * cross;
    let residual_y = (syy - cross.dot(&slopes)).max(0.0);
    let b = slopes[1];
    let se_b = (residual_y / (n * residual_m)).sqrt();
    Ok((a, se_a, b, se_b))
}

/// Sobel's test for a fit with exactly one mediator
#[instrument(skip(fit), fields(method = fit.method.name(), robust = fit.robust))]
pub fn sobel_test(fit: &MediationFit, alternative: Alternative) -> Result<SobelTest> {
    if fit.n_mediators() != 1 {
        return Err(Error::UnsupportedConfiguration(format!(
            "Sobel test requires exactly one mediator, got {}",
            fit.n_mediators()
        )));
    }
    let (a, se_a, b, se_b) = match &fit.model {
        FittedModel::Regression { mediators, outcome } => (
            mediators[0].fit.coefficients[1],
            mediators[0].fit.std_errors[1],
            outcome.fit.coefficients[1],
            outcome.fit.std_errors[1],
        ),
        FittedModel::Covariance(scatter) => covariance_paths(scatter)?,
    };
    let indirect = a * b;
    let se = (b * b * se_a * se_a + a * a * se_b * se_b).sqrt();
    let statistic = indirect / se;
    Ok(SobelTest {
        indirect,
        se,
        statistic,
        p_value: sobel_p_value(statistic, alternative),
        alternative,
        fit: fit.clone(),
    })
}
