//! Common types for confidence intervals

use robust_core::{Error, Result, Validated, Warning};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A confidence interval with lower and upper bounds
///
/// One-sided intervals have an infinite bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound of the interval
    pub lower: f64,
    /// Upper bound of the interval
    pub upper: f64,
    /// The point estimate
    pub estimate: f64,
    /// Confidence level (e.g., 0.95 for 95% CI)
    pub confidence_level: f64,
}

impl ConfidenceInterval {
    /// Create a new confidence interval
    pub fn new(lower: f64, upper: f64, estimate: f64, confidence_level: f64) -> Self {
        Self {
            lower,
            upper,
            estimate,
            confidence_level,
        }
    }

    /// Width of the confidence interval
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Check if a value is contained in the interval
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Whether one bound is infinite
    pub fn is_one_sided(&self) -> bool {
        self.lower.is_infinite() || self.upper.is_infinite()
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% CI: [{:.4}, {:.4}], estimate: {:.4}",
            self.confidence_level * 100.0,
            self.lower,
            self.upper,
            self.estimate
        )
    }
}

/// Confidence level type with validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    /// Level used when a requested level is unusable
    pub const DEFAULT: Self = Self(0.95);

    /// Common confidence levels
    pub const NINETY: Self = Self(0.90);
    pub const NINETY_FIVE: Self = Self(0.95);
    pub const NINETY_NINE: Self = Self(0.99);

    /// Create a new confidence level, rejecting values outside (0, 1)
    pub fn new(level: f64) -> Result<Self> {
        if level > 0.0 && level < 1.0 {
            Ok(Self(level))
        } else {
            Err(Error::InvalidParameter(format!(
                "Confidence level must be in (0, 1), got {level}"
            )))
        }
    }

    /// Accept `level` if it lies in (0, 1), otherwise fall back to 0.95
    ///
    /// The fallback is reported as [`Warning::LevelOutOfRange`] and logged.
    pub fn validated(level: f64) -> Validated<Self> {
        match Self::new(level) {
            Ok(l) => Validated::accepted(l),
            Err(_) => {
                let warning = Warning::LevelOutOfRange {
                    requested: level,
                    used: Self::DEFAULT.0,
                };
                warn!(requested = level, used = Self::DEFAULT.0, "{warning}");
                Validated::corrected(Self::DEFAULT, warning)
            }
        }
    }

    /// Get the confidence level value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Get the alpha level (1 - confidence level)
    pub fn alpha(&self) -> f64 {
        1.0 - self.0
    }

    /// Get the tail probability (alpha/2 for two-tailed)
    pub fn tail_probability(&self) -> f64 {
        self.alpha() / 2.0
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

/// Alternative hypothesis of a test, which also decides the interval shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alternative {
    /// Two-sided interval `[lower, upper]`
    #[default]
    TwoSided,
    /// Effect below zero; interval `(-inf, upper]`
    Less,
    /// Effect above zero; interval `[lower, inf)`
    Greater,
}

impl Alternative {
    /// Name as used in printed summaries
    pub fn name(&self) -> &'static str {
        match self {
            Self::TwoSided => "two-sided",
            Self::Less => "less",
            Self::Greater => "greater",
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an interval is read off the bootstrap distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntervalType {
    /// Empirical percentiles
    #[default]
    Percentile,
    /// Bias-corrected and accelerated percentiles
    Bca,
}

impl IntervalType {
    /// Name of the interval type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Percentile => "percentile",
            Self::Bca => "BCa",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_interval() {
        let ci = ConfidenceInterval::new(2.0, 8.0, 5.0, 0.95);

        assert_eq!(ci.width(), 6.0);
        assert!(ci.contains(5.0));
        assert!(!ci.contains(1.0));
        assert!(!ci.contains(9.0));
        assert!(!ci.is_one_sided());
    }

    #[test]
    fn test_one_sided_contains() {
        let ci = ConfidenceInterval::new(f64::NEG_INFINITY, 0.3, 0.1, 0.95);
        assert!(ci.is_one_sided());
        assert!(ci.contains(-1e12));
        assert!(!ci.contains(0.31));
    }

    #[test]
    fn test_confidence_level() {
        let level = ConfidenceLevel::new(0.95).unwrap();
        assert_eq!(level.value(), 0.95);
        assert!((level.alpha() - 0.05).abs() < 1e-10);
        assert!((level.tail_probability() - 0.025).abs() < 1e-10);
        assert!(ConfidenceLevel::new(1.5).is_err());
        assert!(ConfidenceLevel::new(0.0).is_err());
    }

    #[test]
    fn test_validated_level_falls_back() {
        let v = ConfidenceLevel::validated(1.5);
        assert_eq!(v.value, ConfidenceLevel::DEFAULT);
        assert_eq!(
            v.warning,
            Some(Warning::LevelOutOfRange {
                requested: 1.5,
                used: 0.95
            })
        );

        let v = ConfidenceLevel::validated(f64::NAN);
        assert_eq!(v.value.value(), 0.95);
        assert!(v.was_corrected());

        let v = ConfidenceLevel::validated(0.9);
        assert_eq!(v.value.value(), 0.9);
        assert!(!v.was_corrected());
    }

    #[test]
    fn test_confidence_interval_display() {
        let ci = ConfidenceInterval::new(2.5, 7.5, 5.0, 0.95);
        let display = format!("{}", ci);
        assert!(display.contains("95.0%"));
        assert!(display.contains("2.5000"));
        assert!(display.contains("7.5000"));
        assert!(display.contains("5.0000"));
    }

    #[test]
    fn test_confidence_level_display() {
        assert_eq!(format!("{}", ConfidenceLevel::NINETY_FIVE), "95.0%");
        assert_eq!(format!("{}", ConfidenceLevel::NINETY_NINE), "99.0%");
    }

    #[test]
    fn test_alternative_names() {
        assert_eq!(Alternative::default(), Alternative::TwoSided);
        assert_eq!(Alternative::Less.to_string(), "less");
        assert_eq!(IntervalType::default().name(), "percentile");
    }
}
