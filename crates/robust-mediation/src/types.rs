//! Fitted mediation models

use crate::effects::{EffectLayout, Effects};
use robust_core::{DataMatrix, Error, Result};
use robust_regression::{MedianControl, RegressionFit, RegressionModel, ScatterFit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Variable roles of a mediation model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediationTerms {
    /// Independent variable
    pub x: String,
    /// Dependent variable
    pub y: String,
    /// Mediators, in order
    pub m: Vec<String>,
    /// Additional control variables
    pub covariates: Vec<String>,
}

impl MediationTerms {
    /// `x → m → y` with the given mediators and no covariates
    pub fn new(x: &str, y: &str, m: &[&str]) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
            m: m.iter().map(|s| s.to_string()).collect(),
            covariates: Vec::new(),
        }
    }

    /// Add control variables
    pub fn with_covariates(mut self, covariates: &[&str]) -> Self {
        self.covariates = covariates.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Number of mediators
    pub fn n_mediators(&self) -> usize {
        self.m.len()
    }

    /// All variables, ordered `x, y, m..., covariates...`
    pub fn variables(&self) -> Vec<&str> {
        let mut vars = vec![self.x.as_str(), self.y.as_str()];
        vars.extend(self.m.iter().map(String::as_str));
        vars.extend(self.covariates.iter().map(String::as_str));
        vars
    }

    /// Reject empty mediator lists and variables used in two roles
    pub fn validate(&self) -> Result<()> {
        if self.m.is_empty() {
            return Err(Error::InvalidInput("at least one mediator is required".to_string()));
        }
        let vars = self.variables();
        for (i, v) in vars.iter().enumerate() {
            if vars[..i].contains(v) {
                return Err(Error::InvalidInput(format!(
                    "variable '{v}' appears in more than one role"
                )));
            }
        }
        Ok(())
    }
}

/// How the mediation model was estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitMethod {
    /// Separate regressions for the mediators and the outcome
    #[default]
    Regression,
    /// Effects derived from a joint scatter matrix of `(x, y, m)`
    Covariance,
}

impl FitMethod {
    /// Name of the method
    pub fn name(&self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::Covariance => "covariance",
        }
    }
}

/// A regression together with the model it was fitted from
#[derive(Debug, Clone, PartialEq)]
pub struct FittedRegression {
    pub model: RegressionModel,
    pub fit: RegressionFit,
}

/// Method-specific part of a mediation fit
#[derive(Debug, Clone, PartialEq)]
pub enum FittedModel {
    /// `m_j ~ x + covariates` for every mediator and `y ~ m + x + covariates`
    Regression {
        mediators: Vec<FittedRegression>,
        outcome: FittedRegression,
    },
    /// Scatter of the columns `(x, y, m)`
    Covariance(ScatterFit),
}

/// An immutable fitted mediation model
///
/// `data` holds the complete cases of the model variables, ordered
/// `x, y, m..., covariates...`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediationFit {
    pub terms: MediationTerms,
    pub data: DataMatrix,
    pub method: FitMethod,
    pub robust: bool,
    pub median: bool,
    /// Control reused when median regressions are refitted on resamples
    pub median_control: MedianControl,
    pub model: FittedModel,
    /// Rows dropped for non-finite values
    pub n_removed: usize,
}

impl MediationFit {
    /// Number of observations the model was fitted on
    pub fn n_obs(&self) -> usize {
        self.data.nrows()
    }

    /// Number of mediators
    pub fn n_mediators(&self) -> usize {
        self.terms.n_mediators()
    }

    /// Column layout of effect vectors for this model
    pub fn layout(&self) -> EffectLayout {
        match self.method {
            FitMethod::Regression => EffectLayout::new(&self.terms.m, &self.terms.covariates),
            FitMethod::Covariance => EffectLayout::new(&self.terms.m, &[]),
        }
    }

    /// Point effects of the fitted model
    pub fn effects(&self) -> Effects {
        match &self.model {
            FittedModel::Regression { mediators, outcome } => {
                let a: Vec<_> = mediators.iter().map(|m| &m.fit.coefficients).collect();
                Effects::from_regression(&a, &outcome.fit.coefficients)
            }
            FittedModel::Covariance(scatter) => Effects::from_covariance(&scatter.cov),
        }
    }

    /// Mediator regressions, if this is a regression fit
    pub fn mediator_fits(&self) -> Option<&[FittedRegression]> {
        match &self.model {
            FittedModel::Regression { mediators, .. } => Some(mediators),
            FittedModel::Covariance(_) => None,
        }
    }

    /// Outcome regression, if this is a regression fit
    pub fn outcome_fit(&self) -> Option<&FittedRegression> {
        match &self.model {
            FittedModel::Regression { outcome, .. } => Some(outcome),
            FittedModel::Covariance(_) => None,
        }
    }

    /// Short description of the estimator, e.g. "robust regression"
    pub fn description(&self) -> String {
        let estimator = match (self.method, self.robust, self.median) {
            (FitMethod::Regression, true, true) => "median regression",
            (FitMethod::Regression, true, false) => "robust regression",
            (FitMethod::Regression, false, _) => "least squares regression",
            (FitMethod::Covariance, true, _) => "Huber covariance",
            (FitMethod::Covariance, false, _) => "maximum likelihood covariance",
        };
        estimator.to_string()
    }
}

impl fmt::Display for MediationFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mediation model via {} on {} observations",
            self.description(),
            self.n_obs()
        )?;
        writeln!(
            f,
            "  x = {}, y = {}, m = [{}]",
            self.terms.x,
            self.terms.y,
            self.terms.m.join(", ")
        )?;
        if !self.terms.covariates.is_empty() {
            writeln!(f, "  covariates = [{}]", self.terms.covariates.join(", "))?;
        }
        write!(f, "{}", self.effects().summary(&self.layout()))
    }
}
