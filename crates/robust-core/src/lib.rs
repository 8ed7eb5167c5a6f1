//! Core types and numerics for robust mediation analysis
//!
//! This crate provides the pieces shared by every other crate in the
//! workspace:
//!
//! 1. **Errors** - one error enum and `Result` alias
//! 2. **Execution engines** - sequential or Rayon-parallel evaluation of
//!    independent work items (bootstrap replicates)
//! 3. **Numerics** - normal and chi-squared distribution functions, order
//!    statistics, and the small set of dense linear-algebra kernels the
//!    regression and covariance estimators need
//! 4. **Data** - a named numeric matrix holding the variables of a model
//! 5. **Warnings** - validated values that carry an observable warning when
//!    an input was corrected instead of rejected
//!
//! # Example
//!
//! ```rust
//! use robust_core::{execution::{sequential, ExecutionEngine}, DataMatrix};
//!
//! let data = DataMatrix::from_columns(vec![
//!     ("x", vec![1.0, 2.0, 3.0]),
//!     ("y", vec![2.0, 4.0, 6.0]),
//! ]).unwrap();
//!
//! let engine = sequential();
//! let sums = engine.execute_batch(data.nrows(), |i| data.get(i, 0) + data.get(i, 1));
//! assert_eq!(sums, vec![3.0, 6.0, 9.0]);
//! ```

pub mod data;
pub mod error;
pub mod execution;
pub mod math;
pub mod warning;

// Re-export core types
pub use data::DataMatrix;
pub use error::{Error, Result};
pub use execution::{auto_engine, sequential, ExecutionEngine, ExecutionStrategy, SequentialEngine};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};
pub use warning::{Validated, Warning};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DataMatrix, Error, ExecutionEngine, ExecutionStrategy, Result, SequentialEngine,
        Validated, Warning,
    };
    #[cfg(feature = "parallel")]
    pub use crate::ParallelEngine;
}
