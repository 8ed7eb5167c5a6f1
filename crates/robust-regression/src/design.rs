//! Regression model specification over a named data matrix

use nalgebra::{DMatrix, DVector};
use robust_core::{DataMatrix, Result};

/// Name of the intercept term
pub const INTERCEPT: &str = "(Intercept)";

/// A linear model `response ~ 1 + predictors` addressed by column position
///
/// The model stores positions rather than data so one specification can
/// build design matrices for the full sample and for any resample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressionModel {
    response: usize,
    predictors: Vec<usize>,
    terms: Vec<String>,
}

impl RegressionModel {
    /// Resolve variable names against `data`
    pub fn new(data: &DataMatrix, response: &str, predictors: &[&str]) -> Result<Self> {
        let response_idx = data.column_index(response)?;
        let predictor_idx = predictors
            .iter()
            .map(|p| data.column_index(p))
            .collect::<Result<Vec<_>>>()?;
        let mut terms = Vec::with_capacity(predictors.len() + 1);
        terms.push(INTERCEPT.to_string());
        terms.extend(predictors.iter().map(|p| p.to_string()));
        Ok(Self {
            response: response_idx,
            predictors: predictor_idx,
            terms,
        })
    }

    /// Number of coefficients including the intercept
    pub fn n_coefficients(&self) -> usize {
        self.predictors.len() + 1
    }

    /// Coefficient names, intercept first
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Design matrix and response for the full sample
    pub fn design(&self, data: &DataMatrix) -> (DMatrix<f64>, DVector<f64>) {
        let n = data.nrows();
        let x = DMatrix::from_fn(n, self.n_coefficients(), |i, j| {
            if j == 0 {
                1.0
            } else {
                data.get(i, self.predictors[j - 1])
            }
        });
        let y = DVector::from_fn(n, |i, _| data.get(i, self.response));
        (x, y)
    }

    /// Design matrix and response for the rows at `indices` (repeats allowed)
    pub fn design_rows(&self, data: &DataMatrix, indices: &[usize]) -> (DMatrix<f64>, DVector<f64>) {
        let x = DMatrix::from_fn(indices.len(), self.n_coefficients(), |i, j| {
            if j == 0 {
                1.0
            } else {
                data.get(indices[i], self.predictors[j - 1])
            }
        });
        let y = DVector::from_fn(indices.len(), |i, _| data.get(indices[i], self.response));
        (x, y)
    }
}
