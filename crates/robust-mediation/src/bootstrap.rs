//! Bootstrap test of indirect effects
//!
//! The test draws replicates of the full effect vector with the branch
//! selected by [`BootstrapStatistic::for_fit`], then summarises each
//! indirect-effect column separately over its valid replicates.

use crate::statistics::BootstrapStatistic;
use crate::types::MediationFit;
use robust_confidence::{
    confidence_interval, jackknife_acceleration, p_value, Alternative, Bootstrap,
    ConfidenceInterval, ConfidenceLevel, IntervalType, ReplicateMatrix,
};
use robust_core::{auto_engine, ExecutionEngine, Result, Warning};
use std::fmt;
use tracing::{debug, instrument, warn};

/// Summary of one indirect effect
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectEffect {
    /// `"Total"` or the mediator name
    pub label: String,
    /// Column in the replicate matrix
    pub column: usize,
    /// Mean of the valid replicates
    pub estimate: Option<f64>,
    pub interval: Option<ConfidenceInterval>,
    /// Number of valid replicates
    pub n_valid: usize,
}

/// Result of a bootstrap test
#[derive(Debug, Clone)]
pub struct BootstrapTest {
    pub indirect: Vec<IndirectEffect>,
    pub replicates: ReplicateMatrix,
    pub alternative: Alternative,
    pub n_resamples: usize,
    pub level: ConfidenceLevel,
    pub interval_type: IntervalType,
    /// BCa acceleration per replicate column (zeros for percentile intervals)
    pub acceleration: Vec<f64>,
    pub fit: MediationFit,
    pub warnings: Vec<Warning>,
}

impl BootstrapTest {
    /// Mean of the valid replicates of every effect column
    pub fn effect_estimates(&self) -> Vec<(String, Option<f64>)> {
        self.replicates
            .labels()
            .iter()
            .cloned()
            .zip(self.replicates.column_means())
            .collect()
    }

    /// Bootstrap p-values of the indirect effects, in the order of `indirect`
    pub fn p_values(&self, digits: u32) -> Vec<Option<f64>> {
        self.indirect
            .iter()
            .map(|effect| {
                p_value(
                    &self.replicates,
                    effect.column,
                    self.alternative,
                    self.interval_type,
                    self.acceleration[effect.column],
                    digits,
                )
            })
            .collect()
    }

    /// Re-summarise the stored replicates at another level or alternative
    pub fn retest(&self, level: f64, alternative: Alternative) -> Self {
        let mut warnings = Vec::new();
        let level = ConfidenceLevel::validated(level).into_value(&mut warnings);
        let indirect = summarize(
            &self.fit,
            &self.replicates,
            level,
            alternative,
            self.interval_type,
            &self.acceleration,
        );
        Self {
            indirect,
            alternative,
            level,
            warnings,
            ..self.clone()
        }
    }

    /// Smallest number of valid replicates over the indirect effects
    pub fn n_valid(&self) -> usize {
        self.indirect.iter().map(|e| e.n_valid).min().unwrap_or(0)
    }
}

impl fmt::Display for BootstrapTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Bootstrap test for indirect effect via {}",
            self.fit.description()
        )?;
        writeln!(
            f,
            "  {} resamples, {} interval at level {}, alternative: {}",
            self.n_resamples,
            self.interval_type.name(),
            self.level,
            self.alternative
        )?;
        for effect in &self.indirect {
            match (effect.estimate, &effect.interval) {
                (Some(est), Some(ci)) => writeln!(
                    f,
                    "  {:<16} {:>12.6}  [{:.6}, {:.6}]  ({} valid)",
                    effect.label, est, ci.lower, ci.upper, effect.n_valid
                )?,
                (Some(est), None) => writeln!(
                    f,
                    "  {:<16} {:>12.6}  (no interval, {} valid)",
                    effect.label, est, effect.n_valid
                )?,
                _ => writeln!(f, "  {:<16} {:>12}  (no valid replicates)", effect.label, "NA")?,
            }
        }
        for w in &self.warnings {
            writeln!(f, "  warning: {w}")?;
        }
        Ok(())
    }
}

fn summarize(
    fit: &MediationFit,
    replicates: &ReplicateMatrix,
    level: ConfidenceLevel,
    alternative: Alternative,
    interval_type: IntervalType,
    acceleration: &[f64],
) -> Vec<IndirectEffect> {
    fit.layout()
        .indirect_columns()
        .into_iter()
        .map(|(label, column)| IndirectEffect {
            estimate: replicates.column_mean(column),
            interval: confidence_interval(
                replicates,
                column,
                level,
                alternative,
                interval_type,
                acceleration[column],
            ),
            n_valid: replicates.valid_count(column),
            label,
            column,
        })
        .collect()
}

/// Bootstrap test on the engine selected by the enabled features
pub fn run_bootstrap_test(
    fit: &MediationFit,
    alternative: Alternative,
    n_resamples: usize,
    level: f64,
    interval_type: IntervalType,
    seed: Option<u64>,
) -> Result<BootstrapTest> {
    run_bootstrap_test_with_engine(
        auto_engine(),
        fit,
        alternative,
        n_resamples,
        level,
        interval_type,
        seed,
    )
}

/// Bootstrap test of the indirect effects of `fit`
///
/// A `level` outside (0, 1) is replaced by 0.95 and reported in
/// `warnings`. Replicates that are invalid for a column are ignored in its
/// estimate and interval; a column without valid replicates has neither.
#[instrument(skip(engine, fit), fields(n = fit.n_obs(), mediators = fit.n_mediators()))]
pub fn run_bootstrap_test_with_engine<E: ExecutionEngine>(
    engine: E,
    fit: &MediationFit,
    alternative: Alternative,
    n_resamples: usize,
    level: f64,
    interval_type: IntervalType,
    seed: Option<u64>,
) -> Result<BootstrapTest> {
    let mut warnings = Vec::new();
    let level = ConfidenceLevel::validated(level).into_value(&mut warnings);

    let statistic = BootstrapStatistic::for_fit(fit)?;
    debug!(branch = statistic.name(), "bootstrap branch selected");
    let sample = statistic.sample(fit);

    let bootstrap = Bootstrap::new(engine)
        .with_resamples(n_resamples)
        .with_optional_seed(seed);
    let replicates = bootstrap.resample(sample, &statistic)?;

    let acceleration = match interval_type {
        IntervalType::Percentile => vec![0.0; replicates.n_cols()],
        IntervalType::Bca => {
            let jackknife = bootstrap.jackknife(sample, &statistic)?;
            (0..jackknife.n_cols())
                .map(|j| jackknife_acceleration(&jackknife.valid_column(j)))
                .collect()
        }
    };

    let indirect = summarize(fit, &replicates, level, alternative, interval_type, &acceleration);
    for effect in &indirect {
        debug!(label = %effect.label, n_valid = effect.n_valid, "indirect effect summarised");
        if effect.estimate.is_none() {
            warn!(label = %effect.label, "indirect effect has no valid bootstrap replicates");
        }
    }

    Ok(BootstrapTest {
        indirect,
        replicates,
        alternative,
        n_resamples,
        level,
        interval_type,
        acceleration,
        fit: fit.clone(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{fit_mediation, FitOptions};
    use crate::types::MediationTerms;
    use robust_core::{DataMatrix, SequentialEngine};

    fn data() -> DataMatrix {
        let x: Vec<f64> = (0..50).map(|i| (i as f64 - 24.5) / 5.0).collect();
        let m: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 0.6 * v + [0.3, -0.3, -0.2, 0.2, 0.0][i % 5])
            .collect();
        let y: Vec<f64> = x
            .iter()
            .zip(&m)
            .enumerate()
            .map(|(i, (xv, mv))| 0.5 * mv + 0.2 * xv + [-0.2, 0.1, 0.3, -0.1, -0.1][(i + 2) % 5])
            .collect();
        DataMatrix::from_columns(vec![("x", x), ("m", m), ("y", y)]).unwrap()
    }

    fn run(options: &FitOptions, interval_type: IntervalType) -> BootstrapTest {
        let fit = fit_mediation(&data(), &MediationTerms::new("x", "y", &["m"]), options).unwrap();
        run_bootstrap_test_with_engine(
            SequentialEngine,
            &fit,
            Alternative::TwoSided,
            300,
            0.95,
            interval_type,
            Some(11),
        )
        .unwrap()
    }

    #[test]
    fn test_standard_bootstrap() {
        let result = run(&FitOptions::least_squares(), IntervalType::Percentile);
        assert_eq!(result.indirect.len(), 1);
        assert_eq!(result.indirect[0].label, "m");
        assert_eq!(result.indirect[0].n_valid, 300);
        assert_eq!(result.replicates.n_rows(), 300);
        // the noise patterns are correlated, so compare with the full-sample fit
        let full_sample = result.fit.effects().indirect[0];
        let est = result.indirect[0].estimate.unwrap();
        assert!((est - full_sample).abs() < 0.05);
        let ci = result.indirect[0].interval.unwrap();
        assert!(ci.lower < ci.upper);
        assert!(ci.contains(est));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_fast_robust_bootstrap_bca() {
        let result = run(&FitOptions::robust_regression(), IntervalType::Bca);
        assert_eq!(result.acceleration.len(), result.replicates.n_cols());
        let ci = result.indirect[0].interval.unwrap();
        assert!(ci.lower > 0.0);
        let p = result.p_values(3)[0].unwrap();
        assert!(p < 0.05);
    }

    #[test]
    fn test_retest_reuses_replicates() {
        let result = run(&FitOptions::least_squares(), IntervalType::Percentile);
        let narrower = result.retest(0.5, Alternative::TwoSided);
        assert_eq!(narrower.replicates, result.replicates);
        assert!(narrower.indirect[0].interval.unwrap().width() < result.indirect[0].interval.unwrap().width());

        let greater = result.retest(0.95, Alternative::Greater);
        assert_eq!(greater.indirect[0].interval.unwrap().upper, f64::INFINITY);
    }

    #[test]
    fn test_level_out_of_range_falls_back() {
        let fit = fit_mediation(&data(), &MediationTerms::new("x", "y", &["m"]), &FitOptions::least_squares())
            .unwrap();
        let result = run_bootstrap_test_with_engine(
            SequentialEngine,
            &fit,
            Alternative::TwoSided,
            50,
            1.5,
            IntervalType::Percentile,
            Some(3),
        )
        .unwrap();
        assert_eq!(result.level.value(), 0.95);
        assert_eq!(
            result.warnings,
            vec![Warning::LevelOutOfRange {
                requested: 1.5,
                used: 0.95
            }]
        );
    }

    #[test]
    fn test_effect_estimates_cover_all_columns() {
        let result = run(&FitOptions::least_squares(), IntervalType::Percentile);
        let estimates = result.effect_estimates();
        let labels: Vec<&str> = estimates.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["ab", "a", "b", "c", "c'"]);
        let (_, ab) = &estimates[0];
        assert_eq!(*ab, result.indirect[0].estimate);
    }
}
