//! Property-based tests of the effect algebra, Sobel p-values and the
//! correction operator

use approx::relative_eq;
use nalgebra::{DMatrix, DVector};
use proptest::prelude::*;
use robust_confidence::Alternative;
use robust_mediation::{correction_matrix, sobel_p_value, EffectLayout, Effects};
use robust_regression::PsiControl;

fn coefficient_vectors(p: usize, q: usize) -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>)> {
    (
        prop::collection::vec(prop::collection::vec(-5.0..5.0f64, 2 + q), p),
        prop::collection::vec(-5.0..5.0f64, 2 + p + q),
    )
}

fn names(prefix: &str, k: usize) -> Vec<String> {
    (1..=k).map(|j| format!("{prefix}{j}")).collect()
}

proptest! {
    #[test]
    fn prop_total_effect_is_indirect_plus_direct(
        (p, q, (mediators, outcome)) in (1usize..5, 0usize..3)
            .prop_flat_map(|(p, q)| (Just(p), Just(q), coefficient_vectors(p, q))),
    ) {
        let mediators: Vec<DVector<f64>> = mediators.into_iter().map(DVector::from_vec).collect();
        let outcome = DVector::from_vec(outcome);
        let refs: Vec<&DVector<f64>> = mediators.iter().collect();

        let effects = Effects::from_regression(&refs, &outcome);
        let layout = EffectLayout::new(&names("m", p), &names("z", q));
        let row = effects.to_row();
        prop_assert_eq!(row.len(), layout.n_columns());

        let sum_ab: f64 = (0..p).map(|j| row[layout.ab(j)]).sum();
        if p > 1 {
            prop_assert!(relative_eq!(row[0], sum_ab, epsilon = 1e-12));
        }
        for j in 0..p {
            prop_assert!(relative_eq!(row[layout.ab(j)], row[layout.a(j)] * row[layout.b(j)], epsilon = 1e-12));
        }
        prop_assert!(relative_eq!(row[layout.total()], sum_ab + row[layout.direct()], epsilon = 1e-10));
    }

    #[test]
    fn prop_covariance_effects_are_consistent(
        l in prop::collection::vec(-2.0..2.0f64, 6),
        diag in prop::collection::vec(0.5..3.0f64, 3),
    ) {
        // S = L Lᵀ with a positive diagonal is positive definite
        let lower = DMatrix::from_row_slice(3, 3, &[
            diag[0], 0.0, 0.0,
            l[0], diag[1], 0.0,
            l[1], l[2], diag[2],
        ]);
        let s = &lower * lower.transpose();
        let e = Effects::from_covariance(&s);
        prop_assert!(relative_eq!(e.total, e.indirect[0] + e.direct, epsilon = 1e-9, max_relative = 1e-9));
        prop_assert!(relative_eq!(e.indirect[0], e.a[0] * e.b[0], epsilon = 1e-12));
    }

    #[test]
    fn prop_sobel_p_value_decreases_with_effect(
        ab in 0.0..3.0f64,
        step in 0.01..2.0f64,
        se in 0.1..2.0f64,
    ) {
        let p_small = sobel_p_value(ab / se, Alternative::TwoSided);
        let p_large = sobel_p_value((ab + step) / se, Alternative::TwoSided);
        prop_assert!(p_large <= p_small);
        prop_assert!((0.0..=1.0).contains(&p_small));
        let z = ab / se;
        prop_assert!(relative_eq!(
            sobel_p_value(-z, Alternative::TwoSided),
            p_small,
            epsilon = 1e-14
        ));
    }

    #[test]
    fn prop_correction_is_identity_without_downweighting(
        xs in prop::collection::vec(-10.0..10.0f64, 8..40),
        scale in 0.1..5.0f64,
    ) {
        let n = xs.len();
        let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
        let spread = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - xs.iter().cloned().fold(f64::INFINITY, f64::min);
        prop_assume!(spread > 1.0);
        let residuals = DVector::from_fn(n, |i, _| xs[(i + 1) % n]);
        let psi = PsiControl::huber().with_tuning(1e9);
        let c = correction_matrix(&x, &vec![1.0; n], &residuals, scale, &psi).unwrap();
        let identity = DMatrix::<f64>::identity(2, 2);
        prop_assert!((c - identity).amax() < 1e-6);
    }
}
