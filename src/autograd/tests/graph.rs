//! Graph traversal tests: shared nodes, frozen leaves, deep chains

use crate::autograd::{add, backward, matmul, mul, scale, sum, Tensor};
use approx::assert_abs_diff_eq;

#[test]
fn test_shared_subgraph_counted_once() {
    // y = x * 2; z = y + y; dz/dx = 4
    let x = Tensor::from_vec(vec![1.0, 2.0], true);
    let y = scale(&x, 2.0);
    let z = sum(&add(&y, &y));
    backward(&z, None);

    assert_eq!(x.grad().expect("gradient should be available").to_vec(), vec![4.0, 4.0]);
}

#[test]
fn test_diamond_graph() {
    // a -> b = a*a, c = 3a, d = b + c; dd/da = 2a + 3
    let a = Tensor::from_vec(vec![2.0], true);
    let b = mul(&a, &a);
    let c = scale(&a, 3.0);
    let d = add(&b, &c);
    backward(&d, None);

    assert_abs_diff_eq!(a.grad().expect("gradient should be available")[0], 7.0);
}

#[test]
fn test_frozen_leaves_receive_no_gradient() {
    let w_frozen = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0], false);
    let w_train = Tensor::from_vec(vec![0.5, 0.5], true);
    let x = Tensor::from_vec(vec![1.0, 2.0], false);

    let h = matmul(&x, &w_frozen, 1, 2, 2);
    let loss = sum(&mul(&h, &w_train));
    backward(&loss, None);

    assert!(w_frozen.grad().is_none());
    assert_eq!(w_train.grad().expect("gradient should be available").to_vec(), vec![1.0, 2.0]);
}

#[test]
fn test_deep_chain_does_not_overflow_stack() {
    let x = Tensor::from_vec(vec![1.0], true);
    let mut y = x.clone();
    for _ in 0..1000 {
        y = scale(&y, 1.0);
    }
    backward(&y, None);
    assert_abs_diff_eq!(x.grad().expect("gradient should be available")[0], 1.0);
}
