//! Named column-oriented numeric data

use crate::{Error, Result};
use nalgebra::DMatrix;

/// An `n × k` numeric matrix whose columns carry variable names
///
/// Rows are observations. Column names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    names: Vec<String>,
    values: DMatrix<f64>,
}

impl DataMatrix {
    /// Wrap a matrix, naming its columns
    pub fn new(names: Vec<String>, values: DMatrix<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(Error::size_mismatch(values.ncols(), names.len(), "column names"));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::InvalidInput(format!("Duplicate column '{name}'")));
            }
        }
        Ok(Self { names, values })
    }

    /// Build from `(name, values)` pairs of equal length
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(columns.len());
        let mut flat = Vec::with_capacity(n * columns.len());
        for (name, col) in columns {
            let name = name.into();
            if col.len() != n {
                return Err(Error::size_mismatch(n, col.len(), &format!("column '{name}'")));
            }
            flat.extend_from_slice(&col);
            names.push(name);
        }
        let values = DMatrix::from_column_slice(n, names.len(), &flat);
        Self::new(names, values)
    }

    /// Number of observations
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of variables
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Column names in storage order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Underlying matrix
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::unknown_column(name))
    }

    /// Value at row `i` of column `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Copy of a named column
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let j = self.column_index(name)?;
        Ok(self.values.column(j).iter().copied().collect())
    }

    /// New matrix holding the named columns in the requested order
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let idx = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>>>()?;
        let values = DMatrix::from_fn(self.nrows(), idx.len(), |i, j| self.values[(i, idx[j])]);
        Self::new(names.iter().map(|n| n.to_string()).collect(), values)
    }

    /// Drop rows containing any non-finite value, returning the number removed
    pub fn complete_cases(&self) -> (Self, usize) {
        let keep: Vec<usize> = (0..self.nrows())
            .filter(|&i| self.values.row(i).iter().all(|v| v.is_finite()))
            .collect();
        let removed = self.nrows() - keep.len();
        let values = DMatrix::from_fn(keep.len(), self.ncols(), |i, j| self.values[(keep[i], j)]);
        (
            Self {
                names: self.names.clone(),
                values,
            },
            removed,
        )
    }
}
