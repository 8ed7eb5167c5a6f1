//! Error types for robust mediation analysis
//!
//! Provides a unified error type for all workspace crates.

use thiserror::Error;

/// Core error type for robust statistical operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} observations, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// A matrix that must be inverted is singular or numerically close to it
    #[error("Singular matrix: {0}")]
    Singular(String),

    /// An iterative estimator did not reach its tolerance
    #[error("Convergence failure: {0}")]
    Convergence(String),

    /// Requested combination of method, robustness and test is not supported
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidInput(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for a variable name missing from a data matrix
    pub fn unknown_column(name: &str) -> Self {
        Self::InvalidInput(format!("Unknown column '{name}'"))
    }

    /// Whether the error stems from numerical degeneracy rather than bad input
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Singular(_) | Self::Convergence(_))
    }
}
