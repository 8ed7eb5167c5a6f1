//! Nonparametric bootstrap resampling
//!
//! [`Bootstrap`] draws index vectors uniformly with replacement, hands each
//! one to a [`ReplicateStatistic`] and stacks the results into a
//! [`ReplicateMatrix`]. Replicates are independent, so they are evaluated
//! through the engine's `execute_batch`; replicate `i` seeds its own RNG
//! with `seed + i`, which makes the output identical for every engine.

use crate::ReplicateMatrix;
use rand::prelude::*;
use robust_core::{DataMatrix, Error, ExecutionEngine, Result};
use tracing::{debug, instrument, warn};

/// Default number of bootstrap resamples
pub const DEFAULT_RESAMPLES: usize = 5000;

/// A data set that can be resampled by row
pub trait Sample: Sync {
    /// Number of observations (rows)
    fn n_obs(&self) -> usize;
}

impl Sample for DataMatrix {
    fn n_obs(&self) -> usize {
        self.nrows()
    }
}

impl Sample for [f64] {
    fn n_obs(&self) -> usize {
        self.len()
    }
}

impl Sample for Vec<f64> {
    fn n_obs(&self) -> usize {
        self.len()
    }
}

/// A statistic evaluated on a resample given by row indices
///
/// Implementations are immutable contexts, shared by reference across
/// replicates (and threads). Returning `None` marks the replicate invalid.
pub trait ReplicateStatistic<D: Sample + ?Sized>: Sync {
    /// Names of the returned statistics, in order
    fn labels(&self) -> Vec<String>;

    /// Evaluate on the rows of `data` at `indices` (repeats allowed)
    fn evaluate(&self, data: &D, indices: &[usize]) -> Option<Vec<f64>>;
}

/// Bootstrap resampler
#[derive(Clone, Debug)]
pub struct Bootstrap<E> {
    engine: E,
    n_resamples: usize,
    seed: Option<u64>,
}

impl<E: ExecutionEngine> Bootstrap<E> {
    /// Create a new bootstrap resampler
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            n_resamples: DEFAULT_RESAMPLES,
            seed: None,
        }
    }

    /// Set the number of bootstrap resamples
    pub fn with_resamples(mut self, n_resamples: usize) -> Self {
        self.n_resamples = n_resamples;
        self
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set or clear the random seed
    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Number of resamples drawn
    pub fn n_resamples(&self) -> usize {
        self.n_resamples
    }

    /// The execution engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Indices of replicate `replicate` for a sample of size `n`
    pub fn indices(seed: u64, replicate: usize, n: usize) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(replicate as u64));
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }

    /// Draw the bootstrap distribution of `statistic` on `data`
    #[instrument(skip(self, data, statistic), fields(n = data.n_obs(), n_resamples = self.n_resamples))]
    pub fn resample<D, S>(&self, data: &D, statistic: &S) -> Result<ReplicateMatrix>
    where
        D: Sample + ?Sized,
        S: ReplicateStatistic<D>,
    {
        if self.n_resamples == 0 {
            return Err(Error::InvalidParameter(
                "Number of resamples must be positive".to_string(),
            ));
        }
        let n = data.n_obs();
        if n == 0 {
            return Err(Error::InsufficientData {
                expected: 1,
                actual: 0,
            });
        }
        let labels = statistic.labels();
        let k = labels.len();
        let identity: Vec<usize> = (0..n).collect();
        let original = statistic
            .evaluate(data, &identity)
            .unwrap_or_else(|| vec![f64::NAN; k]);

        let seed = self.seed.unwrap_or_else(|| thread_rng().gen());
        debug!(
            seed,
            k,
            strategy = ?self.engine.strategy(),
            threads = self.engine.num_threads(),
            "drawing bootstrap replicates"
        );

        let rows = self.engine.execute_batch(self.n_resamples, |i| {
            let idx = Self::indices(seed, i, n);
            statistic.evaluate(data, &idx)
        });

        let matrix = ReplicateMatrix::from_rows(labels, original, rows, seed)?;
        let invalid = matrix.invalid_rows();
        if invalid == matrix.n_rows() {
            warn!(n_resamples = self.n_resamples, "every bootstrap replicate is invalid");
        } else {
            debug!(invalid, "bootstrap replicates drawn");
        }
        Ok(matrix)
    }

    /// Leave-one-out evaluations of `statistic`, one row per left-out observation
    #[instrument(skip(self, data, statistic), fields(n = data.n_obs()))]
    pub fn jackknife<D, S>(&self, data: &D, statistic: &S) -> Result<ReplicateMatrix>
    where
        D: Sample + ?Sized,
        S: ReplicateStatistic<D>,
    {
        let n = data.n_obs();
        if n < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: n,
            });
        }
        let labels = statistic.labels();
        let k = labels.len();
        let identity: Vec<usize> = (0..n).collect();
        let original = statistic
            .evaluate(data, &identity)
            .unwrap_or_else(|| vec![f64::NAN; k]);
        let rows = self.engine.execute_batch(n, |left_out| {
            let idx: Vec<usize> = (0..n).filter(|&i| i != left_out).collect();
            statistic.evaluate(data, &idx)
        });
        ReplicateMatrix::from_rows(labels, original, rows, 0)
    }
}
