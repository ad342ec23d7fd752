//! Property-based tests for matmul operations

use super::test_utils::{backward_projected, finite_difference, projected_sum};
use crate::autograd::{matmul, Tensor};
use proptest::prelude::*;

fn matrix(len: usize, salt: f32) -> Vec<f32> {
    (0..len).map(|i| ((i as f32 + salt) * 1.37).sin() * 2.0).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_matmul_backward_gradient_check(
        m in 1usize..5,
        k in 1usize..5,
        n in 1usize..5,
        salt in 0.0f32..10.0,
    ) {
        let a_data = matrix(m * k, salt);
        let b_data = matrix(k * n, salt + 3.0);

        let a = Tensor::from_vec(a_data.clone(), true);
        let b = Tensor::from_vec(b_data.clone(), true);
        backward_projected(&matmul(&a, &b, m, k, n));

        let grad_a = a.grad().expect("gradient should be available");
        let numerical_a = finite_difference(
            |x| {
                let ta = Tensor::from_vec(x.to_vec(), false);
                let tb = Tensor::from_vec(b_data.clone(), false);
                projected_sum(&matmul(&ta, &tb, m, k, n).to_vec())
            },
            &a_data,
            1e-2,
        );
        for i in 0..a_data.len() {
            prop_assert!((grad_a[i] - numerical_a[i]).abs() < 0.05,
                "dA mismatch at {}: {} vs {}", i, grad_a[i], numerical_a[i]);
        }

        let grad_b = b.grad().expect("gradient should be available");
        let numerical_b = finite_difference(
            |x| {
                let ta = Tensor::from_vec(a_data.clone(), false);
                let tb = Tensor::from_vec(x.to_vec(), false);
                projected_sum(&matmul(&ta, &tb, m, k, n).to_vec())
            },
            &b_data,
            1e-2,
        );
        for i in 0..b_data.len() {
            prop_assert!((grad_b[i] - numerical_b[i]).abs() < 0.05,
                "dB mismatch at {}: {} vs {}", i, grad_b[i], numerical_b[i]);
        }
    }
}
