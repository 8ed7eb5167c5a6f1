//! Interval and p-value construction over a replicate matrix
//!
//! These functions read one column of a [`ReplicateMatrix`], ignore its
//! invalid replicates, and dispatch on [`IntervalType`]. A column without a
//! single valid replicate yields `None` instead of an error.

use crate::bootstrap_methods::{bootstrap_p_value, BCaBootstrap, BootstrapMethod, PercentileBootstrap};
use crate::{Alternative, ConfidenceInterval, ConfidenceLevel, IntervalType, ReplicateMatrix};
use tracing::warn;

/// Interval for column `column`, centred on the mean of its valid replicates
///
/// `acceleration` is only used by BCa intervals.
pub fn confidence_interval(
    replicates: &ReplicateMatrix,
    column: usize,
    level: ConfidenceLevel,
    alternative: Alternative,
    interval_type: IntervalType,
    acceleration: f64,
) -> Option<ConfidenceInterval> {
    let values = replicates.valid_column(column);
    let Some(mean) = replicates.column_mean(column) else {
        warn!(
            column = %replicates.labels()[column],
            "no valid bootstrap replicates; interval is undefined"
        );
        return None;
    };
    let original = replicates.original()[column];
    let interval = match interval_type {
        IntervalType::Percentile => {
            PercentileBootstrap.calculate_interval(&values, original, level, alternative)
        }
        IntervalType::Bca => {
            BCaBootstrap::new(acceleration).calculate_interval(&values, original, level, alternative)
        }
    };
    interval.ok().map(|mut ci| {
        ci.estimate = mean;
        ci
    })
}

/// Bootstrap p-value of column `column` to `digits` decimal places
pub fn p_value(
    replicates: &ReplicateMatrix,
    column: usize,
    alternative: Alternative,
    interval_type: IntervalType,
    acceleration: f64,
    digits: u32,
) -> Option<f64> {
    let values = replicates.valid_column(column);
    let original = replicates.original()[column];
    match interval_type {
        IntervalType::Percentile => {
            bootstrap_p_value(&PercentileBootstrap, &values, original, alternative, digits)
        }
        IntervalType::Bca => bootstrap_p_value(
            &BCaBootstrap::new(acceleration),
            &values,
            original,
            alternative,
            digits,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix() -> ReplicateMatrix {
        let rows = (0..=100)
            .map(|i| {
                if i % 10 == 0 {
                    None
                } else {
                    Some(vec![i as f64, f64::NAN])
                }
            })
            .collect();
        ReplicateMatrix::from_rows(
            vec!["ab".to_string(), "broken".to_string()],
            vec![50.0, f64::NAN],
            rows,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_interval_uses_valid_replicates_only() {
        let reps = matrix();
        let ci = confidence_interval(
            &reps,
            0,
            ConfidenceLevel::NINETY_FIVE,
            Alternative::TwoSided,
            IntervalType::Percentile,
            0.0,
        )
        .unwrap();
        assert_eq!(reps.valid_count(0), 90);
        assert_relative_eq!(ci.estimate, 50.0);
        assert!(ci.lower > 0.0 && ci.upper < 100.0);
        assert!(ci.contains(ci.estimate));
    }

    #[test]
    fn test_column_without_valid_replicates() {
        let reps = matrix();
        for interval_type in [IntervalType::Percentile, IntervalType::Bca] {
            assert!(confidence_interval(
                &reps,
                1,
                ConfidenceLevel::NINETY_FIVE,
                Alternative::Greater,
                interval_type,
                0.0,
            )
            .is_none());
        }
        assert!(p_value(&reps, 1, Alternative::TwoSided, IntervalType::Percentile, 0.0, 4).is_none());
    }

    #[test]
    fn test_one_sided_from_matrix() {
        let reps = matrix();
        let ci = confidence_interval(
            &reps,
            0,
            ConfidenceLevel::NINETY_FIVE,
            Alternative::Greater,
            IntervalType::Bca,
            0.0,
        )
        .unwrap();
        assert_eq!(ci.upper, f64::INFINITY);
        assert!(ci.lower.is_finite());
    }

    #[test]
    fn test_p_value_of_positive_column() {
        let reps = matrix();
        let p = p_value(&reps, 0, Alternative::TwoSided, IntervalType::Percentile, 0.0, 4).unwrap();
        assert!(p < 0.01);
    }
}
