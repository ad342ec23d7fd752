//! Property-based tests for layer_norm and rms_norm

use super::test_utils::{backward_projected, finite_difference, projected_sum};
use crate::autograd::{layer_norm, rms_norm, Tensor};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_layer_norm_gradient_check(
        x in prop::collection::vec(-3.0f32..3.0, 6),
        g in prop::collection::vec(0.5f32..1.5, 3),
    ) {
        // Keep every row well spread so the variance stays away from zero
        let x: Vec<f32> =
            x.iter().enumerate().map(|(i, v)| v * 0.3 + [0.0, 1.5, -1.5][i % 3]).collect();
        let beta = vec![0.1, -0.2, 0.3];
        let input = Tensor::from_vec(x.clone(), true);
        let gamma = Tensor::from_vec(g.clone(), true);
        backward_projected(&layer_norm(
            &input, &gamma, &Tensor::from_vec(beta.clone(), false), 2, 3, 1e-3,
        ));

        let analytical = input.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |v| {
                let y = layer_norm(
                    &Tensor::from_vec(v.to_vec(), false),
                    &Tensor::from_vec(g.clone(), false),
                    &Tensor::from_vec(beta.clone(), false),
                    2, 3, 1e-3,
                );
                projected_sum(&y.to_vec())
            },
            &x,
            1e-2,
        );
        for i in 0..x.len() {
            prop_assert!((analytical[i] - numerical[i]).abs() < 0.1,
                "dx mismatch at {}: {} vs {}", i, analytical[i], numerical[i]);
        }
    }

    #[test]
    fn prop_rms_norm_gradient_check(
        x in prop::collection::vec(0.2f32..3.0, 8),
        g in prop::collection::vec(0.5f32..1.5, 4),
    ) {
        let input = Tensor::from_vec(x.clone(), true);
        let gamma = Tensor::from_vec(g.clone(), false);
        backward_projected(&rms_norm(&input, &gamma, 2, 4, 1e-5));

        let analytical = input.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |v| {
                let y = rms_norm(&Tensor::from_vec(v.to_vec(), false), &Tensor::from_vec(g.clone(), false), 2, 4, 1e-5);
                projected_sum(&y.to_vec())
            },
            &x,
            1e-2,
        );
        for i in 0..x.len() {
            prop_assert!((analytical[i] - numerical[i]).abs() < 0.05,
                "dx mismatch at {}: {} vs {}", i, analytical[i], numerical[i]);
        }
    }
}
