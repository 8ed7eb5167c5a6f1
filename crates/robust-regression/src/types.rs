//! Common types for fitted regressions

use crate::psi::{standardize, PsiControl};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a per-observation weight vector represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightKind {
    /// `ψ(u)/u` from a robust regression fit, in [0, 1]
    Robustness,
    /// Huber-type weights of a robust scatter estimate
    Consistency,
}

/// Per-observation weights tagged with their kind
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    pub kind: WeightKind,
    pub values: DVector<f64>,
}

impl Weights {
    /// Robustness weights of a regression fit
    pub fn robustness(values: DVector<f64>) -> Self {
        Self {
            kind: WeightKind::Robustness,
            values,
        }
    }

    /// Consistency weights of a scatter fit
    pub fn consistency(values: DVector<f64>) -> Self {
        Self {
            kind: WeightKind::Consistency,
            values,
        }
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no observations
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element-wise square roots
    pub fn sqrt(&self) -> DVector<f64> {
        self.values.map(|w| w.max(0.0).sqrt())
    }

    /// Number of distinct observations among `indices` with a strictly positive weight
    pub fn count_positive_distinct(&self, indices: &[usize]) -> usize {
        let mut seen = vec![false; self.values.len()];
        let mut count = 0;
        for &i in indices {
            if !seen[i] {
                seen[i] = true;
                if self.values[i] > 0.0 {
                    count += 1;
                }
            }
        }
        count
    }
}

/// Estimation method behind a regression fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegressionMethod {
    /// Ordinary least squares
    LeastSquares,
    /// Robust M-estimation via iteratively reweighted least squares
    MEstimator,
    /// Least absolute deviations (median, τ = 0.5)
    Median,
}

impl RegressionMethod {
    /// Name of the method
    pub fn name(&self) -> &'static str {
        match self {
            Self::LeastSquares => "least squares",
            Self::MEstimator => "M-estimator",
            Self::Median => "median regression",
        }
    }
}

/// Robustness information carried by an M-estimator fit
#[derive(Debug, Clone, PartialEq)]
pub struct RobustnessInfo {
    /// Robustness weights `ψ(u)/u` at convergence
    pub weights: Weights,
    /// The psi function used
    pub psi: PsiControl,
    /// Whether IRLS reached its tolerance
    pub converged: bool,
    /// IRLS iterations performed
    pub iterations: usize,
}

/// A fitted linear regression `y = Xβ + e`
///
/// The first coefficient is the intercept; the remaining follow the
/// predictor order of the design.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFit {
    pub method: RegressionMethod,
    /// Coefficient names, `"(Intercept)"` first
    pub terms: Vec<String>,
    pub coefficients: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Residual scale (σ̂ for least squares, the robust scale otherwise)
    pub scale: f64,
    /// Present for M-estimator fits only
    pub robustness: Option<RobustnessInfo>,
}

impl RegressionFit {
    /// Attach coefficient names
    pub fn with_terms(mut self, terms: Vec<String>) -> Self {
        self.terms = terms;
        self
    }

    /// Number of observations used in the fit
    pub fn n_obs(&self) -> usize {
        self.residuals.len()
    }

    /// Number of coefficients including the intercept
    pub fn n_coefficients(&self) -> usize {
        self.coefficients.len()
    }

    /// Coefficient of a named term
    pub fn coefficient(&self, term: &str) -> Option<f64> {
        self.terms
            .iter()
            .position(|t| t == term)
            .map(|j| self.coefficients[j])
    }

    /// Standard error of a named term
    pub fn std_error(&self, term: &str) -> Option<f64> {
        self.terms
            .iter()
            .position(|t| t == term)
            .map(|j| self.std_errors[j])
    }

    /// Robustness weights, if this is an M-estimator fit
    pub fn robustness_weights(&self) -> Option<&Weights> {
        self.robustness.as_ref().map(|r| &r.weights)
    }

    /// Residuals divided by the scale
    pub fn standardized_residuals(&self) -> DVector<f64> {
        standardize(&self.residuals, self.scale)
    }
}

impl fmt::Display for RegressionFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} fit on {} observations", self.method.name(), self.n_obs())?;
        for (j, coef) in self.coefficients.iter().enumerate() {
            let name = self.terms.get(j).map(String::as_str).unwrap_or("?");
            writeln!(f, "  {:<16} {:>12.6} ({:.6})", name, coef, self.std_errors[j])?;
        }
        write!(f, "  residual scale: {:.6}", self.scale)
    }
}
