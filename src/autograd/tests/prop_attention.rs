//! Property-based tests for attention operations

use super::test_utils::{backward_projected, finite_difference, projected_sum};
use crate::autograd::{
    attend, attention_weights, rotary_embedding, AttentionShape, Rotary, RotaryStyle, Tensor,
};
use proptest::prelude::*;

const SHAPE: AttentionShape =
    AttentionShape { seq_len: 3, num_heads: 2, num_kv_heads: 1, head_dim: 2 };

fn full_attention(q: &[f32], k: &[f32], v: &[f32]) -> Vec<f32> {
    let w = attention_weights(&Tensor::from_vec(q.to_vec(), false), &Tensor::from_vec(k.to_vec(), false), SHAPE);
    attend(&w, &Tensor::from_vec(v.to_vec(), false), SHAPE).to_vec()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_attention_gradient_check_q_k_v(
        q in prop::collection::vec(-1.5f32..1.5, 12),
        k in prop::collection::vec(-1.5f32..1.5, 6),
        v in prop::collection::vec(-1.5f32..1.5, 6),
    ) {
        let tq = Tensor::from_vec(q.clone(), true);
        let tk = Tensor::from_vec(k.clone(), true);
        let tv = Tensor::from_vec(v.clone(), true);
        let w = attention_weights(&tq, &tk, SHAPE);
        backward_projected(&attend(&w, &tv, SHAPE));

        let gq = tq.grad().expect("gradient should be available");
        let nq = finite_difference(|x| projected_sum(&full_attention(x, &k, &v)), &q, 1e-2);
        for i in 0..q.len() {
            prop_assert!((gq[i] - nq[i]).abs() < 0.05, "dq mismatch at {}: {} vs {}", i, gq[i], nq[i]);
        }

        let gk = tk.grad().expect("gradient should be available");
        let nk = finite_difference(|x| projected_sum(&full_attention(&q, x, &v)), &k, 1e-2);
        for i in 0..k.len() {
            prop_assert!((gk[i] - nk[i]).abs() < 0.05, "dk mismatch at {}: {} vs {}", i, gk[i], nk[i]);
        }

        let gv = tv.grad().expect("gradient should be available");
        let nv = finite_difference(|x| projected_sum(&full_attention(&q, &k, x)), &v, 1e-2);
        for i in 0..v.len() {
            prop_assert!((gv[i] - nv[i]).abs() < 0.05, "dv mismatch at {}: {} vs {}", i, gv[i], nv[i]);
        }
    }

    #[test]
    fn prop_rotary_gradient_check(
        x in prop::collection::vec(-2.0f32..2.0, 24),
        interleaved in any::<bool>(),
    ) {
        let style = if interleaved { RotaryStyle::Interleaved } else { RotaryStyle::HalfSplit };
        let rotary = Rotary { style, rotary_dim: 4, theta: 100.0 };
        let input = Tensor::from_vec(x.clone(), true);
        backward_projected(&rotary_embedding(&input, rotary, 3, 2, 4));

        let analytical = input.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |v| projected_sum(&rotary_embedding(&Tensor::from_vec(v.to_vec(), false), rotary, 3, 2, 4).to_vec()),
            &x,
            1e-2,
        );
        for i in 0..x.len() {
            prop_assert!((analytical[i] - numerical[i]).abs() < 0.02);
        }
    }
}
