//! Bootstrap method implementations
//!
//! A method maps nominal tail probabilities onto quantiles of the bootstrap
//! distribution. Intervals for every alternative are built from those
//! quantiles: `[q(α/2), q(1-α/2)]` for two-sided, `(-inf, q(level)]` for
//! `less` and `[q(1-level), inf)` for `greater`, which is the two-sided
//! interval at level `1 - 2(1 - level)` with one bound dropped.

use crate::{Alternative, ConfidenceInterval, ConfidenceLevel};
use robust_core::math::distributions::normal;
use robust_core::math::order::{quantile_sorted, sorted_finite};
use robust_core::{Error, Result};
use tracing::{debug, instrument};

/// Bootstrap method for calculating confidence intervals
pub trait BootstrapMethod: Clone + Send + Sync {
    /// Quantiles of the bootstrap distribution at (adjusted) probabilities
    ///
    /// `sorted` holds the finite bootstrap estimates in ascending order.
    fn quantiles(&self, sorted: &[f64], original_estimate: f64, probs: &[f64]) -> Vec<f64>;

    /// Method name for documentation
    fn name(&self) -> &'static str;

    /// Calculate a confidence interval from the bootstrap distribution
    ///
    /// Non-finite estimates are ignored. The interval's `estimate` is the
    /// original estimate.
    fn calculate_interval(
        &self,
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: ConfidenceLevel,
        alternative: Alternative,
    ) -> Result<ConfidenceInterval> {
        let sorted = sorted_finite(bootstrap_estimates);
        if sorted.is_empty() {
            return Err(Error::InvalidInput("No bootstrap estimates".to_string()));
        }
        let level = confidence_level.value();
        let (lower, upper) = match alternative {
            Alternative::TwoSided => {
                let tail = confidence_level.tail_probability();
                let q = self.quantiles(&sorted, original_estimate, &[tail, 1.0 - tail]);
                (q[0], q[1])
            }
            Alternative::Less => {
                let q = self.quantiles(&sorted, original_estimate, &[level]);
                (f64::NEG_INFINITY, q[0])
            }
            Alternative::Greater => {
                let q = self.quantiles(&sorted, original_estimate, &[1.0 - level]);
                (q[0], f64::INFINITY)
            }
        };
        Ok(ConfidenceInterval::new(lower, upper, original_estimate, level))
    }
}

/// Percentile bootstrap method
///
/// The simplest bootstrap method. Uses the empirical percentiles of the
/// bootstrap distribution to construct the confidence interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentileBootstrap;

impl BootstrapMethod for PercentileBootstrap {
    fn quantiles(&self, sorted: &[f64], _original_estimate: f64, probs: &[f64]) -> Vec<f64> {
        probs.iter().map(|&p| quantile_sorted(sorted, p)).collect()
    }

    fn name(&self) -> &'static str {
        "Percentile Bootstrap"
    }
}

/// BCa (bias-corrected and accelerated) bootstrap method
///
/// Percentiles are shifted by the bias correction
/// `z0 = Φ⁻¹(#{θ* < θ̂} / R)` and the acceleration `a`:
///
/// p' = Φ(z0 + (z0 + z_p) / (1 - a (z0 + z_p)))
#[derive(Debug, Clone, Copy, Default)]
pub struct BCaBootstrap {
    /// Acceleration, usually from [`jackknife_acceleration`]
    pub acceleration: f64,
}

impl BCaBootstrap {
    /// BCa with a given acceleration
    pub fn new(acceleration: f64) -> Self {
        Self {
            acceleration: if acceleration.is_finite() {
                acceleration
            } else {
                0.0
            },
        }
    }

    /// Bias correction `z0`, zero when every estimate lies on one side
    pub fn bias_correction(sorted: &[f64], original_estimate: f64) -> f64 {
        let below = sorted.partition_point(|&x| x < original_estimate) as f64;
        let proportion = below / sorted.len() as f64;
        if proportion <= 0.0 || proportion >= 1.0 {
            0.0
        } else {
            normal::quantile(proportion)
        }
    }

    fn adjust(&self, z0: f64, p: f64) -> f64 {
        let z = normal::quantile(p);
        let a = self.acceleration;
        let adjusted = normal::cdf(z0 + (z0 + z) / (1.0 - a * (z0 + z)));
        if adjusted.is_finite() {
            adjusted
        } else {
            p
        }
    }
}

impl BootstrapMethod for BCaBootstrap {
    #[instrument(skip(self, sorted, probs), fields(n_estimates = sorted.len(), acceleration = self.acceleration))]
    fn quantiles(&self, sorted: &[f64], original_estimate: f64, probs: &[f64]) -> Vec<f64> {
        let z0 = Self::bias_correction(sorted, original_estimate);
        debug!(z0, "BCa bias correction");
        probs
            .iter()
            .map(|&p| quantile_sorted(sorted, self.adjust(z0, p)))
            .collect()
    }

    fn name(&self) -> &'static str {
        "BCa Bootstrap"
    }
}

/// Acceleration from leave-one-out estimates
///
/// `a = Σd³ / (6 (Σd²)^{3/2})` with `dᵢ = mean(θ₍.₎) - θ₍ᵢ₎`. Non-finite
/// jackknife values are skipped; returns 0 for a degenerate jackknife.
pub fn jackknife_acceleration(jackknife: &[f64]) -> f64 {
    let values: Vec<f64> = jackknife.iter().copied().filter(|v| v.is_finite()).collect();
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let (s2, s3) = values.iter().fold((0.0, 0.0), |(s2, s3), v| {
        let d = mean - v;
        (s2 + d * d, s3 + d * d * d)
    });
    if s2 <= 0.0 {
        return 0.0;
    }
    s3 / (6.0 * s2.powf(1.5))
}

/// Bootstrap p-value: the smallest α at which the 1 - α interval excludes 0
///
/// Found by bisection to `digits` decimal places. Returns `None` when there
/// are no finite estimates.
pub fn bootstrap_p_value<M: BootstrapMethod>(
    method: &M,
    bootstrap_estimates: &[f64],
    original_estimate: f64,
    alternative: Alternative,
    digits: u32,
) -> Option<f64> {
    let sorted = sorted_finite(bootstrap_estimates);
    if sorted.is_empty() {
        return None;
    }
    let excludes_zero = |alpha: f64| -> bool {
        match alternative {
            Alternative::TwoSided => {
                let q = method.quantiles(&sorted, original_estimate, &[alpha / 2.0, 1.0 - alpha / 2.0]);
                q[0] > 0.0 || q[1] < 0.0
            }
            Alternative::Less => method.quantiles(&sorted, original_estimate, &[1.0 - alpha])[0] < 0.0,
            Alternative::Greater => method.quantiles(&sorted, original_estimate, &[alpha])[0] > 0.0,
        }
    };

    let scale = 10f64.powi(digits.min(15) as i32);
    let tolerance = 0.5 / scale;
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..64 {
        if hi - lo <= tolerance {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if excludes_zero(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Some((hi * scale).round() / scale)
}
