//! Effect extraction from regression coefficients or a scatter matrix
//!
//! Effect vectors have a fixed column order shared by point estimates and
//! bootstrap replicates:
//!
//! `[ab_Total (p > 1), ab_1..ab_p, a_1..a_p, b_1..b_p, c, c', covariates...]`
//!
//! where `a_j` is the slope of `x` in the regression of mediator `j`, `b_j`
//! the slope of mediator `j` in the outcome regression, `c` the direct
//! effect of `x` on `y`, and `c' = Σ a_j b_j + c` the total effect.
//! Covariate effects are the outcome-regression coefficients of the
//! covariates.
//!
//! Regression coefficient vectors are laid out intercept first: mediator
//! regressions as `[1, x, covariates...]`, the outcome regression as
//! `[1, m_1..m_p, x, covariates...]`.

use nalgebra::{DMatrix, DVector};

/// Label of the summed indirect effect
pub const TOTAL_LABEL: &str = "Total";

/// Positions in the scatter matrix of a covariance fit
pub(crate) const COV_X: usize = 0;
pub(crate) const COV_Y: usize = 1;
pub(crate) const COV_M: usize = 2;

/// Column layout of effect vectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectLayout {
    mediators: Vec<String>,
    covariates: Vec<String>,
}

impl EffectLayout {
    /// Layout for the given mediators and covariates
    pub fn new(mediators: &[String], covariates: &[String]) -> Self {
        Self {
            mediators: mediators.to_vec(),
            covariates: covariates.to_vec(),
        }
    }

    /// Number of mediators
    pub fn n_mediators(&self) -> usize {
        self.mediators.len()
    }

    /// Whether the vector starts with the summed indirect effect
    pub fn has_total(&self) -> bool {
        self.mediators.len() > 1
    }

    fn offset(&self) -> usize {
        usize::from(self.has_total())
    }

    /// Total number of columns
    pub fn n_columns(&self) -> usize {
        self.offset() + 3 * self.n_mediators() + 2 + self.covariates.len()
    }

    /// Column of the indirect effect through mediator `j`
    pub fn ab(&self, j: usize) -> usize {
        self.offset() + j
    }

    /// Column of the `x → m_j` path
    pub fn a(&self, j: usize) -> usize {
        self.offset() + self.n_mediators() + j
    }

    /// Column of the `m_j → y` path
    pub fn b(&self, j: usize) -> usize {
        self.offset() + 2 * self.n_mediators() + j
    }

    /// Column of the direct effect `c`
    pub fn direct(&self) -> usize {
        self.offset() + 3 * self.n_mediators()
    }

    /// Column of the total effect `c'`
    pub fn total(&self) -> usize {
        self.direct() + 1
    }

    /// Indirect-effect columns with their reporting labels
    ///
    /// One mediator: the mediator name. Several: `"Total"` for the sum,
    /// then each mediator name.
    pub fn indirect_columns(&self) -> Vec<(String, usize)> {
        if self.has_total() {
            std::iter::once((TOTAL_LABEL.to_string(), 0))
                .chain(
                    self.mediators
                        .iter()
                        .enumerate()
                        .map(|(j, m)| (m.clone(), self.ab(j))),
                )
                .collect()
        } else {
            vec![(self.mediators[0].clone(), 0)]
        }
    }

    /// Column labels in layout order
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.n_columns());
        if self.has_total() {
            labels.push(format!("ab_{TOTAL_LABEL}"));
            labels.extend(self.mediators.iter().map(|m| format!("ab_{m}")));
            labels.extend(self.mediators.iter().map(|m| format!("a_{m}")));
            labels.extend(self.mediators.iter().map(|m| format!("b_{m}")));
        } else {
            labels.extend(["ab", "a", "b"].map(String::from));
        }
        labels.push("c".to_string());
        labels.push("c'".to_string());
        labels.extend(self.covariates.iter().cloned());
        labels
    }
}

/// Effects of one mediation model (point estimate or replicate)
#[derive(Debug, Clone, PartialEq)]
pub struct Effects {
    /// `a_j b_j` per mediator
    pub indirect: Vec<f64>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    /// Direct effect `c`
    pub direct: f64,
    /// Total effect `c' = Σ ab + c`
    pub total: f64,
    pub covariates: Vec<f64>,
}

impl Effects {
    /// Effects from mediator-regression and outcome-regression coefficients
    ///
    /// NaN coefficients propagate into every effect that depends on them.
    pub fn from_regression(mediators: &[&DVector<f64>], outcome: &DVector<f64>) -> Self {
        let p = mediators.len();
        let a: Vec<f64> = mediators.iter().map(|coef| coef[1]).collect();
        let b: Vec<f64> = (0..p).map(|j| outcome[1 + j]).collect();
        let direct = outcome[1 + p];
        let covariates = outcome.iter().skip(2 + p).copied().collect();
        Self::from_paths(a, b, direct, covariates)
    }

    /// Effects from a scatter matrix of `(x, y, m)`
    pub fn from_covariance(s: &DMatrix<f64>) -> Self {
        let (sxx, syy_x, smx) = (s[(COV_X, COV_X)], s[(COV_Y, COV_X)], s[(COV_M, COV_X)]);
        let (smm, sym) = (s[(COV_M, COV_M)], s[(COV_Y, COV_M)]);
        let a = smx / sxx;
        let det = sxx * smm - smx * smx;
        let b = (-smx * syy_x + sxx * sym) / det;
        let direct = (smm * syy_x - smx * sym) / det;
        let total = syy_x / sxx;
        Self {
            indirect: vec![a * b],
            a: vec![a],
            b: vec![b],
            direct,
            total,
            covariates: Vec::new(),
        }
    }

    fn from_paths(a: Vec<f64>, b: Vec<f64>, direct: f64, covariates: Vec<f64>) -> Self {
        let indirect: Vec<f64> = a.iter().zip(&b).map(|(a, b)| a * b).collect();
        let total = indirect.iter().sum::<f64>() + direct;
        Self {
            indirect,
            a,
            b,
            direct,
            total,
            covariates,
        }
    }

    /// Sum of the indirect effects
    pub fn total_indirect(&self) -> f64 {
        self.indirect.iter().sum()
    }

    /// Flatten into layout order
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(3 * self.indirect.len() + 3 + self.covariates.len());
        if self.indirect.len() > 1 {
            row.push(self.total_indirect());
        }
        row.extend(&self.indirect);
        row.extend(&self.a);
        row.extend(&self.b);
        row.push(self.direct);
        row.push(self.total);
        row.extend(&self.covariates);
        row
    }

    /// Labelled table of all effects
    pub fn summary(&self, layout: &EffectLayout) -> String {
        layout
            .labels()
            .iter()
            .zip(self.to_row())
            .map(|(label, value)| format!("  {label:<16} {value:>12.6}\n"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_mediator_layout() {
        let layout = EffectLayout::new(&names(&["m"]), &names(&["z"]));
        assert_eq!(layout.labels(), vec!["ab", "a", "b", "c", "c'", "z"]);
        assert_eq!(layout.n_columns(), 6);
        assert_eq!(layout.direct(), 3);
        assert_eq!(layout.indirect_columns(), vec![("m".to_string(), 0)]);
    }

    #[test]
    fn test_multiple_mediator_layout() {
        let layout = EffectLayout::new(&names(&["m1", "m2"]), &[]);
        assert_eq!(
            layout.labels(),
            vec!["ab_Total", "ab_m1", "ab_m2", "a_m1", "a_m2", "b_m1", "b_m2", "c", "c'"]
        );
        assert_eq!(layout.ab(1), 2);
        assert_eq!(layout.a(0), 3);
        assert_eq!(layout.b(1), 6);
        assert_eq!(layout.total(), 8);
        assert_eq!(
            layout.indirect_columns(),
            vec![("Total".to_string(), 0), ("m1".to_string(), 1), ("m2".to_string(), 2)]
        );
    }

    #[test]
    fn test_single_mediator_regression_effects() {
        let a = DVector::from_row_slice(&[0.0, 0.5, 9.0]);
        // [1, m, x, z]
        let outcome = DVector::from_row_slice(&[1.0, 0.4, 0.1, -2.0]);
        let e = Effects::from_regression(&[&a], &outcome);
        assert_relative_eq!(e.indirect[0], 0.2);
        assert_relative_eq!(e.direct, 0.1);
        assert_relative_eq!(e.total, 0.3);
        assert_eq!(e.covariates, vec![-2.0]);
        assert_eq!(e.to_row().len(), 6);
    }

    #[test]
    fn test_summary_lists_every_effect() {
        let a = DVector::from_row_slice(&[0.0, 0.5, 9.0]);
        let outcome = DVector::from_row_slice(&[1.0, 0.4, 0.1, -2.0]);
        let e = Effects::from_regression(&[&a], &outcome);
        let layout = EffectLayout::new(&names(&["m"]), &names(&["z"]));
        let summary = e.summary(&layout);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].trim_start().starts_with("ab"));
        assert!(lines[0].ends_with("0.200000"));
        assert!(lines[5].trim_start().starts_with('z'));
        assert!(summary.ends_with('\n'));
    }

    #[test]
    fn test_multiple_mediator_effects() {
        let a1 = DVector::from_row_slice(&[0.0, 2.0]);
        let a2 = DVector::from_row_slice(&[0.0, -1.0]);
        let outcome = DVector::from_row_slice(&[0.0, 0.5, 0.25, 0.3]);
        let e = Effects::from_regression(&[&a1, &a2], &outcome);
        let row = e.to_row();
        assert_relative_eq!(row[0], 1.0 - 0.25);
        assert_relative_eq!(row[0], row[1] + row[2]);
        assert_relative_eq!(row[8], row[0] + row[7]);
    }

    #[test]
    fn test_nan_propagates() {
        let a = DVector::from_row_slice(&[0.0, 0.5]);
        let outcome = DVector::from_row_slice(&[f64::NAN; 3]);
        let row = Effects::from_regression(&[&a], &outcome).to_row();
        assert!(row[0].is_nan());
        assert_eq!(row[1], 0.5);
        assert!(row[2].is_nan() && row[3].is_nan() && row[4].is_nan());
    }

    #[test]
    fn test_covariance_effects_match_regression_identity() {
        // x, y, m with S chosen so that c' = ab + c must hold
        let s = DMatrix::from_row_slice(3, 3, &[2.0, 1.1, 0.8, 1.1, 3.0, 0.9, 0.8, 0.9, 1.5]);
        let e = Effects::from_covariance(&s);
        assert_relative_eq!(e.a[0], 0.4);
        assert_relative_eq!(e.total, 1.1 / 2.0);
        assert_relative_eq!(e.total, e.indirect[0] + e.direct, epsilon = 1e-12);
    }
}
