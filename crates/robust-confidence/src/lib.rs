//! Bootstrap resampling and confidence intervals
//!
//! This crate provides the resampling side of a bootstrap test:
//!
//! - **Resampling**: [`Bootstrap`] evaluates a [`ReplicateStatistic`] on
//!   index resamples and collects a [`ReplicateMatrix`]
//! - **Intervals**: percentile and BCa methods, two-sided or one-sided
//!   according to an [`Alternative`]
//! - **p-values**: the smallest α at which the interval excludes zero
//!
//! # Examples
//!
//! ```rust
//! use robust_confidence::{
//!     confidence_interval, Alternative, Bootstrap, ConfidenceLevel, IntervalType,
//!     ReplicateStatistic,
//! };
//! use robust_core::execution::SequentialEngine;
//!
//! struct Mean;
//!
//! impl ReplicateStatistic<[f64]> for Mean {
//!     fn labels(&self) -> Vec<String> {
//!         vec!["mean".to_string()]
//!     }
//!
//!     fn evaluate(&self, data: &[f64], indices: &[usize]) -> Option<Vec<f64>> {
//!         let sum: f64 = indices.iter().map(|&i| data[i]).sum();
//!         Some(vec![sum / indices.len() as f64])
//!     }
//! }
//!
//! let sample: Vec<f64> = (1..=40).map(|i| i as f64).collect();
//! let replicates = Bootstrap::new(SequentialEngine)
//!     .with_resamples(500)
//!     .with_seed(42)
//!     .resample(sample.as_slice(), &Mean)
//!     .unwrap();
//!
//! let ci = confidence_interval(
//!     &replicates,
//!     0,
//!     ConfidenceLevel::NINETY_FIVE,
//!     Alternative::TwoSided,
//!     IntervalType::Percentile,
//!     0.0,
//! )
//! .unwrap();
//! assert!(ci.contains(20.5));
//! ```

pub mod api;
mod bootstrap;
mod bootstrap_methods;
mod replicates;
mod types;

// Re-exports
pub use api::{confidence_interval, p_value};
pub use bootstrap::{Bootstrap, ReplicateStatistic, Sample, DEFAULT_RESAMPLES};
pub use bootstrap_methods::{
    bootstrap_p_value, jackknife_acceleration, BCaBootstrap, BootstrapMethod, PercentileBootstrap,
};
pub use replicates::ReplicateMatrix;
pub use types::{Alternative, ConfidenceInterval, ConfidenceLevel, IntervalType};
