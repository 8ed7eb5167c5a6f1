//! Fitting mediation models
//!
//! With the regression method, every mediator is regressed on `x` and the
//! covariates, and `y` is regressed on all mediators, `x` and the
//! covariates. With the covariance method, the effects follow from one
//! scatter estimate of `(x, y, m)`.

use crate::types::{FitMethod, FittedModel, FittedRegression, MediationFit, MediationTerms};
use robust_core::{DataMatrix, Error, Result};
use robust_regression::{
    HuberControl, HuberScatter, MEstimator, MaximumLikelihood, MedianControl, MedianRegression,
    OrdinaryLeastSquares, RegressionEstimator, RegressionModel, RobustControl, ScatterEstimator,
    ScatterFit,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Options of [`fit_mediation`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub method: FitMethod,
    /// Use robust estimators
    pub robust: bool,
    /// Use median regression instead of M-estimation (robust regression only)
    pub median: bool,
    pub regression: RobustControl,
    pub median_control: MedianControl,
    pub covariance: HuberControl,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            method: FitMethod::Regression,
            robust: true,
            median: false,
            regression: RobustControl::default(),
            median_control: MedianControl::default(),
            covariance: HuberControl::default(),
        }
    }
}

impl FitOptions {
    /// Robust regression via M-estimation
    pub fn robust_regression() -> Self {
        Self::default()
    }

    /// Least-squares regression
    pub fn least_squares() -> Self {
        Self {
            robust: false,
            ..Self::default()
        }
    }

    /// Median regression
    pub fn median_regression() -> Self {
        Self {
            median: true,
            ..Self::default()
        }
    }

    /// Covariance method, Huber-type if `robust`
    pub fn covariance(robust: bool) -> Self {
        Self {
            method: FitMethod::Covariance,
            robust,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: FitMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_robust(mut self, robust: bool) -> Self {
        self.robust = robust;
        self
    }

    pub fn with_median(mut self, median: bool) -> Self {
        self.median = median;
        self
    }

    /// Set the control of the M-estimator
    pub fn with_regression_control(mut self, control: RobustControl) -> Self {
        self.regression = control;
        self
    }

    /// Set the control of median regression
    pub fn with_median_control(mut self, control: MedianControl) -> Self {
        self.median_control = control;
        self
    }

    /// Set the control of the Huber scatter estimator
    pub fn with_covariance_control(mut self, control: HuberControl) -> Self {
        self.covariance = control;
        self
    }

    /// Reject combinations that have no estimator
    pub fn validate(&self, terms: &MediationTerms) -> Result<()> {
        match self.method {
            FitMethod::Covariance => {
                if self.median {
                    return Err(Error::UnsupportedConfiguration(
                        "median regression is not available with the covariance method".to_string(),
                    ));
                }
                if terms.n_mediators() != 1 {
                    return Err(Error::UnsupportedConfiguration(format!(
                        "the covariance method supports exactly one mediator, got {}",
                        terms.n_mediators()
                    )));
                }
                if !terms.covariates.is_empty() {
                    return Err(Error::UnsupportedConfiguration(
                        "the covariance method does not support covariates".to_string(),
                    ));
                }
                self.covariance.validate()
            }
            FitMethod::Regression => {
                if self.median && !self.robust {
                    return Err(Error::UnsupportedConfiguration(
                        "median regression requires robust = true".to_string(),
                    ));
                }
                if self.median {
                    self.median_control.validate()
                } else {
                    self.regression.validate()
                }
            }
        }
    }
}

/// Fit a mediation model to the complete cases of `data`
#[instrument(skip(data, options), fields(method = options.method.name(), robust = options.robust, median = options.median))]
pub fn fit_mediation(data: &DataMatrix, terms: &MediationTerms, options: &FitOptions) -> Result<MediationFit> {
    terms.validate()?;
    options.validate(terms)?;

    let (data, n_removed) = data.select(&terms.variables())?.complete_cases();
    if n_removed > 0 {
        debug!(n_removed, "dropped rows with non-finite values");
    }

    let model = match options.method {
        FitMethod::Regression => match (options.robust, options.median) {
            (false, _) => fit_regressions(&data, terms, &OrdinaryLeastSquares)?,
            (true, false) => fit_regressions(
                &data,
                terms,
                &MEstimator {
                    control: options.regression,
                    start: options.median_control,
                },
            )?,
            (true, true) => {
                fit_regressions(&data, terms, &MedianRegression::new(options.median_control))?
            }
        },
        FitMethod::Covariance => FittedModel::Covariance(fit_scatter(&data, options)?),
    };

    Ok(MediationFit {
        terms: terms.clone(),
        data,
        method: options.method,
        robust: options.robust,
        median: options.median,
        median_control: options.median_control,
        model,
        n_removed,
    })
}

fn fit_one<E: RegressionEstimator>(
    data: &DataMatrix,
    response: &str,
    predictors: &[&str],
    estimator: &E,
) -> Result<FittedRegression> {
    let model = RegressionModel::new(data, response, predictors)?;
    let (x, y) = model.design(data);
    let fit = estimator.fit(&x, &y)?.with_terms(model.terms().to_vec());
    Ok(FittedRegression { model, fit })
}

fn fit_regressions<E: RegressionEstimator>(
    data: &DataMatrix,
    terms: &MediationTerms,
    estimator: &E,
) -> Result<FittedModel> {
    let covariates: Vec<&str> = terms.covariates.iter().map(String::as_str).collect();

    let mediator_predictors: Vec<&str> = std::iter::once(terms.x.as_str())
        .chain(covariates.iter().copied())
        .collect();
    let mediators = terms
        .m
        .iter()
        .map(|m| fit_one(data, m, &mediator_predictors, estimator))
        .collect::<Result<Vec<_>>>()?;

    let outcome_predictors: Vec<&str> = terms
        .m
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(terms.x.as_str()))
        .chain(covariates.iter().copied())
        .collect();
    let outcome = fit_one(data, &terms.y, &outcome_predictors, estimator)?;

    debug!(method = estimator.method().name(), "mediation regressions fitted");
    Ok(FittedModel::Regression { mediators, outcome })
}

fn fit_scatter(data: &DataMatrix, options: &FitOptions) -> Result<ScatterFit> {
    if options.robust {
        HuberScatter::new(options.covariance).estimate(data.values())
    } else {
        MaximumLikelihood.estimate(data.values())
    }
}
