//! Per-replicate statistics of the bootstrap test
//!
//! The branch is chosen once from the fit, and each branch carries an
//! immutable context built from the original sample. Replicates only read
//! from it, so they can be evaluated on any execution engine.

use crate::correction::CorrectedRegression;
use crate::effects::{EffectLayout, Effects};
use crate::types::{FitMethod, FittedModel, FittedRegression, MediationFit};
use nalgebra::DVector;
use robust_confidence::ReplicateStatistic;
use robust_core::math::linalg::select_rows;
use robust_core::{DataMatrix, Error, Result};
use robust_regression::{
    ml_covariance, MedianRegression, OrdinaryLeastSquares, RegressionEstimator, RegressionModel,
};

/// Context for branches that refit an estimator on every replicate
#[derive(Debug, Clone)]
pub struct RefitContext<R> {
    estimator: R,
    mediators: Vec<RegressionModel>,
    outcome: RegressionModel,
    layout: EffectLayout,
}

impl<R: RegressionEstimator> RefitContext<R> {
    fn new(estimator: R, mediators: &[FittedRegression], outcome: &FittedRegression, layout: EffectLayout) -> Self {
        Self {
            estimator,
            mediators: mediators.iter().map(|m| m.model.clone()).collect(),
            outcome: outcome.model.clone(),
            layout,
        }
    }

    fn refit(&self, model: &RegressionModel, data: &DataMatrix, indices: &[usize]) -> Option<DVector<f64>> {
        let (x, y) = model.design_rows(data, indices);
        self.estimator.coefficients(&x, &y).ok()
    }

    fn evaluate(&self, data: &DataMatrix, indices: &[usize]) -> Option<Vec<f64>> {
        let mediators: Vec<Option<DVector<f64>>> = self
            .mediators
            .iter()
            .map(|model| self.refit(model, data, indices))
            .collect();
        let outcome = self.refit(&self.outcome, data, indices);
        let sizes: Vec<usize> = self.mediators.iter().map(RegressionModel::n_coefficients).collect();
        effects_row(mediators, outcome, &sizes, self.outcome.n_coefficients())
    }
}

/// Context of the fast-and-robust bootstrap
#[derive(Debug, Clone)]
pub struct FastRobustContext {
    mediators: Vec<CorrectedRegression>,
    outcome: CorrectedRegression,
    layout: EffectLayout,
}

impl FastRobustContext {
    /// Build the correction operators of every regression in `fit`
    pub fn new(data: &DataMatrix, mediators: &[FittedRegression], outcome: &FittedRegression, layout: EffectLayout) -> Result<Self> {
        let mediators = mediators
            .iter()
            .map(|m| CorrectedRegression::build(&m.model, data, &m.fit))
            .collect::<Result<Vec<_>>>()?;
        let outcome = CorrectedRegression::build(&outcome.model, data, &outcome.fit)?;
        Ok(Self {
            mediators,
            outcome,
            layout,
        })
    }

    /// Correction operators, mediator regressions first
    pub fn corrections(&self) -> impl Iterator<Item = &CorrectedRegression> {
        self.mediators.iter().chain(std::iter::once(&self.outcome))
    }

    fn evaluate(&self, data: &DataMatrix, indices: &[usize]) -> Option<Vec<f64>> {
        let mediators: Vec<Option<DVector<f64>>> = self
            .mediators
            .iter()
            .map(|m| m.replicate(data, indices))
            .collect();
        let outcome = self.outcome.replicate(data, indices);
        let sizes: Vec<usize> = self.mediators.iter().map(CorrectedRegression::n_coefficients).collect();
        effects_row(mediators, outcome, &sizes, self.outcome.n_coefficients())
    }
}

/// Context of the covariance bootstrap
///
/// For a robust fit the resampled data are the cleaned observations
/// `wᵢ(xᵢ - μ)/√τ` of the original scatter fit, so that each replicate only
/// needs a maximum-likelihood covariance.
#[derive(Debug, Clone)]
pub struct CovarianceContext {
    cleaned: Option<DataMatrix>,
    layout: EffectLayout,
}

impl CovarianceContext {
    fn evaluate(&self, data: &DataMatrix, indices: &[usize]) -> Option<Vec<f64>> {
        let rows = select_rows(data.values(), indices);
        let (_, cov) = ml_covariance(&rows).ok()?;
        let row = Effects::from_covariance(&cov).to_row();
        row.iter().any(|v| v.is_finite()).then_some(row)
    }
}

/// Replicate statistic of one bootstrap branch
#[derive(Debug, Clone)]
pub enum BootstrapStatistic {
    /// Least-squares refit on every replicate
    StandardRegression(RefitContext<OrdinaryLeastSquares>),
    /// Corrected one-step weighted least squares
    FastRobustRegression(FastRobustContext),
    /// Median regression refit on every replicate
    MedianRegression(RefitContext<MedianRegression>),
    /// Maximum-likelihood covariance of (possibly cleaned) data
    Covariance(CovarianceContext),
}

impl BootstrapStatistic {
    /// Select the branch for `fit` and build its context
    pub fn for_fit(fit: &MediationFit) -> Result<Self> {
        let layout = fit.layout();
        match (&fit.model, fit.method) {
            (FittedModel::Regression { mediators, outcome }, FitMethod::Regression) => {
                match (fit.robust, fit.median) {
                    (false, false) => Ok(Self::StandardRegression(RefitContext::new(
                        OrdinaryLeastSquares,
                        mediators,
                        outcome,
                        layout,
                    ))),
                    (true, false) => Ok(Self::FastRobustRegression(FastRobustContext::new(
                        &fit.data, mediators, outcome, layout,
                    )?)),
                    (true, true) => Ok(Self::MedianRegression(RefitContext::new(
                        MedianRegression::new(fit.median_control),
                        mediators,
                        outcome,
                        layout,
                    ))),
                    (false, true) => Err(Error::UnsupportedConfiguration(
                        "median regression requires a robust fit".to_string(),
                    )),
                }
            }
            (FittedModel::Covariance(scatter), FitMethod::Covariance) => {
                let cleaned = if fit.robust {
                    let values = scatter.clean(fit.data.values());
                    Some(DataMatrix::new(fit.data.names().to_vec(), values)?)
                } else {
                    None
                };
                Ok(Self::Covariance(CovarianceContext { cleaned, layout }))
            }
            _ => Err(Error::UnsupportedConfiguration(format!(
                "fitted model does not match method '{}'",
                fit.method.name()
            ))),
        }
    }

    /// Name of the branch
    pub fn name(&self) -> &'static str {
        match self {
            Self::StandardRegression(_) => "standard regression",
            Self::FastRobustRegression(_) => "fast-and-robust regression",
            Self::MedianRegression(_) => "median regression",
            Self::Covariance(_) => "covariance",
        }
    }

    /// Column layout of the replicate vectors
    pub fn layout(&self) -> &EffectLayout {
        match self {
            Self::StandardRegression(ctx) => &ctx.layout,
            Self::FastRobustRegression(ctx) => &ctx.layout,
            Self::MedianRegression(ctx) => &ctx.layout,
            Self::Covariance(ctx) => &ctx.layout,
        }
    }

    /// Data the replicates are drawn from
    pub fn sample<'a>(&'a self, fit: &'a MediationFit) -> &'a DataMatrix {
        match self {
            Self::Covariance(CovarianceContext {
                cleaned: Some(cleaned),
                ..
            }) => cleaned,
            _ => &fit.data,
        }
    }
}

impl ReplicateStatistic<DataMatrix> for BootstrapStatistic {
    fn labels(&self) -> Vec<String> {
        self.layout().labels()
    }

    fn evaluate(&self, data: &DataMatrix, indices: &[usize]) -> Option<Vec<f64>> {
        match self {
            Self::StandardRegression(ctx) => ctx.evaluate(data, indices),
            Self::FastRobustRegression(ctx) => ctx.evaluate(data, indices),
            Self::MedianRegression(ctx) => ctx.evaluate(data, indices),
            Self::Covariance(ctx) => ctx.evaluate(data, indices),
        }
    }
}

/// Effect row from per-regression coefficients, NaN for failed regressions
///
/// `None` only when every regression failed.
fn effects_row(
    mediators: Vec<Option<DVector<f64>>>,
    outcome: Option<DVector<f64>>,
    mediator_sizes: &[usize],
    outcome_size: usize,
) -> Option<Vec<f64>> {
    if outcome.is_none() && mediators.iter().all(Option::is_none) {
        return None;
    }
    let nan = |size: usize| DVector::from_element(size, f64::NAN);
    let mediators: Vec<DVector<f64>> = mediators
        .into_iter()
        .zip(mediator_sizes)
        .map(|(beta, &size)| beta.unwrap_or_else(|| nan(size)))
        .collect();
    let outcome = outcome.unwrap_or_else(|| nan(outcome_size));
    let a: Vec<&DVector<f64>> = mediators.iter().collect();
    Some(Effects::from_regression(&a, &outcome).to_row())
}
