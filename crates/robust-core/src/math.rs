//! Mathematical utilities for robust mediation analysis
//!
//! Distribution functions used by interval construction and hypothesis
//! tests, order statistics used by robust scale estimates, and the handful
//! of dense linear-algebra operations every regression in the workspace
//! goes through.

/// Distribution-related mathematical functions
pub mod distributions {
    /// Standard normal distribution utilities
    pub mod normal {
        use statrs::function::erf::{erfc, erfc_inv};
        use std::f64::consts::{PI, SQRT_2};

        /// Cumulative distribution function of the standard normal distribution
        pub fn cdf(x: f64) -> f64 {
            if x.is_nan() {
                return f64::NAN;
            }
            0.5 * erfc(-x / SQRT_2)
        }

        /// Upper tail probability `1 - cdf(x)`, accurate for large `x`
        pub fn sf(x: f64) -> f64 {
            if x.is_nan() {
                return f64::NAN;
            }
            0.5 * erfc(x / SQRT_2)
        }

        /// Density of the standard normal distribution
        pub fn pdf(x: f64) -> f64 {
            (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
        }

        /// Inverse cumulative distribution function (quantile function)
        pub fn quantile(p: f64) -> f64 {
            if p.is_nan() {
                return f64::NAN;
            }
            if p <= 0.0 {
                return f64::NEG_INFINITY;
            }
            if p >= 1.0 {
                return f64::INFINITY;
            }
            -SQRT_2 * erfc_inv(2.0 * p)
        }

        #[cfg(test)]
        mod tests {
            use super::*;
            use approx::assert_relative_eq;

            #[test]
            fn test_normal_cdf() {
                assert_relative_eq!(cdf(0.0), 0.5, epsilon = 1e-12);
                assert_relative_eq!(cdf(-1.959963984540054), 0.025, epsilon = 1e-10);
                assert_relative_eq!(cdf(1.959963984540054), 0.975, epsilon = 1e-10);
                assert_relative_eq!(sf(1.959963984540054), 0.025, epsilon = 1e-10);
            }

            #[test]
            fn test_normal_quantile() {
                assert_relative_eq!(quantile(0.5), 0.0, epsilon = 1e-12);
                assert_relative_eq!(quantile(0.975), 1.959963984540054, epsilon = 1e-9);
                assert_eq!(quantile(0.0), f64::NEG_INFINITY);
                assert_eq!(quantile(1.0), f64::INFINITY);
            }

            #[test]
            fn test_cdf_quantile_inverse() {
                for &p in &[0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 0.75, 0.9, 0.95, 0.99] {
                    let x = quantile(p);
                    assert!((cdf(x) - p).abs() < 1e-10, "Failed for p={p}");
                }
            }
        }
    }

    /// Chi-squared distribution utilities
    pub mod chi_squared {
        use crate::{Error, Result};
        use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};

        fn distribution(df: f64) -> Result<ChiSquared> {
            ChiSquared::new(df)
                .map_err(|e| Error::InvalidParameter(format!("chi-squared with {df} df: {e}")))
        }

        /// Cumulative distribution function with `df` degrees of freedom
        pub fn cdf(x: f64, df: f64) -> Result<f64> {
            Ok(distribution(df)?.cdf(x))
        }

        /// Quantile function with `df` degrees of freedom
        pub fn quantile(p: f64, df: f64) -> Result<f64> {
            if !(0.0..1.0).contains(&p) {
                return Err(Error::InvalidParameter(format!(
                    "probability {p} must be in [0, 1)"
                )));
            }
            let dist = distribution(df)?;
            // statrs' inversion is only accurate to about 1e-4; polish with Newton steps
            let mut x = dist.inverse_cdf(p);
            for _ in 0..8 {
                let density = dist.pdf(x);
                if !(density.is_finite() && density > 0.0) {
                    break;
                }
                let step = (dist.cdf(x) - p) / density;
                x = (x - step).max(0.0);
                if step.abs() <= 1e-14 * x.max(1.0) {
                    break;
                }
            }
            Ok(x)
        }

        #[cfg(test)]
        mod tests {
            use super::*;
            use approx::assert_relative_eq;

            #[test]
            fn test_quantile_two_df_closed_form() {
                // χ²₂ is exponential with mean 2
                for &p in &[0.05, 0.5, 0.9, 0.95, 0.99] {
                    let x = quantile(p, 2.0).unwrap();
                    assert_relative_eq!(x, -2.0 * (1.0 - p).ln(), epsilon = 1e-10);
                }
            }

            #[test]
            fn test_quantile_inverts_cdf() {
                for &df in &[1.0, 3.0, 5.0] {
                    for &p in &[0.1, 0.5, 0.95] {
                        let x = quantile(p, df).unwrap();
                        assert!((cdf(x, df).unwrap() - p).abs() < 1e-10, "df={df} p={p}");
                    }
                }
                assert!(quantile(1.0, 3.0).is_err());
            }
        }
    }
}

/// Order statistics on unsorted samples
pub mod order {
    /// Sort a copy of the finite values of `data`
    pub fn sorted_finite(data: &[f64]) -> Vec<f64> {
        let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    /// Sample quantile with linear interpolation between order statistics
    ///
    /// `sorted` must be sorted ascending; returns NaN when empty.
    pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return f64::NAN;
        }
        let p = p.clamp(0.0, 1.0);
        let h = (sorted.len() - 1) as f64 * p;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    }

    /// Median of the finite values of `data`
    pub fn median(data: &[f64]) -> f64 {
        quantile_sorted(&sorted_finite(data), 0.5)
    }

    /// Normalized median absolute value (consistent for the normal sigma)
    ///
    /// Residual scales are taken about zero rather than about the median.
    pub fn mad_about_zero(data: &[f64]) -> f64 {
        let abs: Vec<f64> = data.iter().map(|v| v.abs()).collect();
        MAD_CONSISTENCY * median(&abs)
    }

    /// Consistency factor of the MAD for the normal distribution
    pub const MAD_CONSISTENCY: f64 = 1.482602218505602;

}

/// Dense linear algebra on `nalgebra` matrices
pub mod linalg {
    use crate::{Error, Result};
    use nalgebra::{DMatrix, DVector};
    use tracing::debug;

    /// Relative pivot threshold below which a Gram matrix is treated as singular
    pub const SINGULARITY_TOLERANCE: f64 = 1e-10;

    /// `Xᵀ diag(w) X`
    pub fn weighted_gram(x: &DMatrix<f64>, w: &[f64]) -> DMatrix<f64> {
        let p = x.ncols();
        let mut gram = DMatrix::zeros(p, p);
        for (i, &wi) in w.iter().enumerate() {
            if wi == 0.0 {
                continue;
            }
            for j in 0..p {
                let xij = wi * x[(i, j)];
                for k in j..p {
                    gram[(j, k)] += xij * x[(i, k)];
                }
            }
        }
        for j in 0..p {
            for k in 0..j {
                gram[(j, k)] = gram[(k, j)];
            }
        }
        gram
    }

    /// `Xᵀ diag(w) y`
    pub fn weighted_cross(x: &DMatrix<f64>, w: &[f64], y: &DVector<f64>) -> DVector<f64> {
        let p = x.ncols();
        let mut out = DVector::zeros(p);
        for (i, &wi) in w.iter().enumerate() {
            if wi == 0.0 {
                continue;
            }
            let wy = wi * y[i];
            for j in 0..p {
                out[j] += x[(i, j)] * wy;
            }
        }
        out
    }

    /// Check the diagonal of a symmetric matrix for numerical rank loss
    fn check_conditioning(gram: &DMatrix<f64>, context: &str) -> Result<()> {
        let max_diag = gram.diagonal().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if !max_diag.is_finite() || max_diag == 0.0 {
            debug!(context, max_diag, "matrix has a degenerate diagonal");
            return Err(Error::Singular(format!("{context} has a zero or non-finite diagonal")));
        }
        Ok(())
    }

    /// Solve the symmetric positive definite system `A b = rhs`
    pub fn solve_spd(a: &DMatrix<f64>, rhs: &DVector<f64>, context: &str) -> Result<DVector<f64>> {
        check_conditioning(a, context)?;
        let chol = a
            .clone()
            .cholesky()
            .ok_or_else(|| Error::Singular(format!("{context} is not positive definite")))?;
        let l = chol.l();
        let max_diag = a.diagonal().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let min_pivot = l.diagonal().iter().fold(f64::INFINITY, |m, v| m.min(v * v));
        if min_pivot <= SINGULARITY_TOLERANCE * max_diag {
            debug!(context, min_pivot, max_diag, "Cholesky pivot below singularity tolerance");
            return Err(Error::Singular(format!("{context} is numerically rank deficient")));
        }
        Ok(chol.solve(rhs))
    }

    /// Invert a symmetric positive definite matrix
    pub fn invert_spd(a: &DMatrix<f64>, context: &str) -> Result<DMatrix<f64>> {
        check_conditioning(a, context)?;
        let max_diag = a.diagonal().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let chol = a
            .clone()
            .cholesky()
            .ok_or_else(|| Error::Singular(format!("{context} is not positive definite")))?;
        let min_pivot = chol.l().diagonal().iter().fold(f64::INFINITY, |m, v| m.min(v * v));
        if min_pivot <= SINGULARITY_TOLERANCE * max_diag {
            debug!(context, min_pivot, max_diag, "Cholesky pivot below singularity tolerance");
            return Err(Error::Singular(format!("{context} is numerically rank deficient")));
        }
        Ok(chol.inverse())
    }

    /// Invert a general square matrix via LU decomposition
    pub fn invert(a: &DMatrix<f64>, context: &str) -> Result<DMatrix<f64>> {
        check_conditioning(a, context)?;
        a.clone()
            .try_inverse()
            .filter(|inv| inv.iter().all(|v| v.is_finite()))
            .ok_or_else(|| {
                debug!(context, dim = a.nrows(), "LU inversion failed");
                Error::Singular(format!("{context} is not invertible"))
            })
    }

    /// Rows of `x` at the given positions, in order (repeats allowed)
    pub fn select_rows(x: &DMatrix<f64>, indices: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(indices.len(), x.ncols(), |i, j| x[(indices[i], j)])
    }

    /// Entries of `v` at the given positions, in order (repeats allowed)
    pub fn select_entries(v: &DVector<f64>, indices: &[usize]) -> DVector<f64> {
        DVector::from_iterator(indices.len(), indices.iter().map(|&i| v[i]))
    }

}
