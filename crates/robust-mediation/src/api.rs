//! Entry point for testing indirect effects

use crate::bootstrap::{run_bootstrap_test_with_engine, BootstrapTest};
use crate::sobel::{sobel_test, SobelTest};
use crate::types::MediationFit;
use robust_confidence::{Alternative, IntervalType, DEFAULT_RESAMPLES};
use robust_core::{auto_engine, ExecutionEngine, Result, Warning};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Kind of test for the indirect effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TestType {
    #[default]
    Bootstrap,
    Sobel,
}

/// Options of [`test_mediation`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOptions {
    pub test: TestType,
    pub alternative: Alternative,
    pub n_resamples: usize,
    /// Confidence level; values outside (0, 1) fall back to 0.95
    pub level: f64,
    pub interval_type: IntervalType,
    pub seed: Option<u64>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            test: TestType::Bootstrap,
            alternative: Alternative::TwoSided,
            n_resamples: DEFAULT_RESAMPLES,
            level: 0.95,
            interval_type: IntervalType::Percentile,
            seed: None,
        }
    }
}

impl TestOptions {
    /// Bootstrap test with default settings
    pub fn bootstrap() -> Self {
        Self::default()
    }

    /// Sobel's test
    pub fn sobel() -> Self {
        Self {
            test: TestType::Sobel,
            ..Self::default()
        }
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_resamples(mut self, n_resamples: usize) -> Self {
        self.n_resamples = n_resamples;
        self
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn with_interval_type(mut self, interval_type: IntervalType) -> Self {
        self.interval_type = interval_type;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Result of [`test_mediation`]
#[derive(Debug, Clone)]
pub enum MediationTest {
    Bootstrap(BootstrapTest),
    Sobel(SobelTest),
}

impl MediationTest {
    /// Warnings raised while running the test
    pub fn warnings(&self) -> &[Warning] {
        match self {
            Self::Bootstrap(b) => &b.warnings,
            Self::Sobel(_) => &[],
        }
    }

    /// The fitted model that was tested
    pub fn fit(&self) -> &MediationFit {
        match self {
            Self::Bootstrap(b) => &b.fit,
            Self::Sobel(s) => &s.fit,
        }
    }

    pub fn as_bootstrap(&self) -> Option<&BootstrapTest> {
        match self {
            Self::Bootstrap(b) => Some(b),
            Self::Sobel(_) => None,
        }
    }

    pub fn as_sobel(&self) -> Option<&SobelTest> {
        match self {
            Self::Sobel(s) => Some(s),
            Self::Bootstrap(_) => None,
        }
    }
}

impl fmt::Display for MediationTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrap(b) => fmt::Display::fmt(b, f),
            Self::Sobel(s) => fmt::Display::fmt(s, f),
        }
    }
}

/// Test the indirect effect(s) of `fit`
pub fn test_mediation(fit: &MediationFit, options: &TestOptions) -> Result<MediationTest> {
    test_mediation_with_engine(auto_engine(), fit, options)
}

/// Test the indirect effect(s) of `fit` on the given engine
///
/// Sobel's test is only defined for one mediator. With several mediators the
/// bootstrap test runs instead and the result carries
/// [`Warning::SobelFallback`].
pub fn test_mediation_with_engine<E: ExecutionEngine>(
    engine: E,
    fit: &MediationFit,
    options: &TestOptions,
) -> Result<MediationTest> {
    let mut fallback = None;
    if options.test == TestType::Sobel {
        if fit.n_mediators() == 1 {
            return sobel_test(fit, options.alternative).map(MediationTest::Sobel);
        }
        let warning = Warning::SobelFallback {
            n_mediators: fit.n_mediators(),
        };
        warn!("{warning}");
        fallback = Some(warning);
    }
    let mut result = run_bootstrap_test_with_engine(
        engine,
        fit,
        options.alternative,
        options.n_resamples,
        options.level,
        options.interval_type,
        options.seed,
    )?;
    if let Some(warning) = fallback {
        result.warnings.insert(0, warning);
    }
    Ok(MediationTest::Bootstrap(result))
}
