//! Storage for bootstrap replicates

use robust_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// R × k matrix of replicate statistics, one row per bootstrap replicate
///
/// Invalid replicates are stored as rows of NaN so row `i` always belongs
/// to replicate `i`. Individual cells may also be NaN when a statistic is
/// undefined for some columns only; every column therefore has its own
/// count of valid replicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateMatrix {
    labels: Vec<String>,
    /// Row-major values
    values: Vec<f64>,
    n_rows: usize,
    /// Statistic on the original sample
    original: Vec<f64>,
    /// Seed the resampling indices were derived from
    seed: u64,
}

impl ReplicateMatrix {
    /// Assemble from per-replicate rows, `None` marking an invalid replicate
    pub fn from_rows(
        labels: Vec<String>,
        original: Vec<f64>,
        rows: Vec<Option<Vec<f64>>>,
        seed: u64,
    ) -> Result<Self> {
        let k = labels.len();
        if original.len() != k {
            return Err(Error::size_mismatch(k, original.len(), "original statistic"));
        }
        let n_rows = rows.len();
        let mut values = Vec::with_capacity(n_rows * k);
        for row in rows {
            match row {
                Some(r) if r.len() == k => values.extend(r),
                Some(r) => return Err(Error::size_mismatch(k, r.len(), "replicate row")),
                None => values.extend(std::iter::repeat(f64::NAN).take(k)),
            }
        }
        Ok(Self {
            labels,
            values,
            n_rows,
            original,
            seed,
        })
    }

    /// Number of replicates (including invalid ones)
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of statistics per replicate
    pub fn n_cols(&self) -> usize {
        self.labels.len()
    }

    /// Column labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Position of a labelled column
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Statistic evaluated on the original sample
    pub fn original(&self) -> &[f64] {
        &self.original
    }

    /// Seed of the resampling indices
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Values of replicate `i`
    pub fn row(&self, i: usize) -> &[f64] {
        let k = self.n_cols();
        &self.values[i * k..(i + 1) * k]
    }

    /// All values of column `j`, NaN included
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.n_rows).map(|i| self.values[i * self.n_cols() + j]).collect()
    }

    /// Finite values of column `j`
    pub fn valid_column(&self, j: usize) -> Vec<f64> {
        self.column(j).into_iter().filter(|v| v.is_finite()).collect()
    }

    /// Number of replicates with a finite value in column `j`
    pub fn valid_count(&self, j: usize) -> usize {
        (0..self.n_rows)
            .filter(|&i| self.values[i * self.n_cols() + j].is_finite())
            .count()
    }

    /// Number of rows with no finite value at all
    pub fn invalid_rows(&self) -> usize {
        (0..self.n_rows)
            .filter(|&i| self.row(i).iter().all(|v| !v.is_finite()))
            .count()
    }

    /// Mean of the valid replicates of column `j`, `None` if there are none
    pub fn column_mean(&self, j: usize) -> Option<f64> {
        let valid = self.valid_column(j);
        if valid.is_empty() {
            None
        } else {
            Some(valid.iter().sum::<f64>() / valid.len() as f64)
        }
    }

    /// Means of all columns
    pub fn column_means(&self) -> Vec<Option<f64>> {
        (0..self.n_cols()).map(|j| self.column_mean(j)).collect()
    }
}
