//! Matrix multiplication autograd operations
//!
//! Matrices are stored row-major in flat tensors. GEMM is delegated to
//! ndarray's `dot`.

use crate::autograd::{needs_grad, BackwardOp, Tensor};
use ndarray::{Array1, ArrayView2};
use std::cell::RefCell;
use std::rc::Rc;

/// View a flat buffer as a (rows x cols) matrix
pub(crate) fn as_matrix(data: &[f32], rows: usize, cols: usize) -> ArrayView2<'_, f32> {
    ArrayView2::from_shape((rows, cols), data)
        .unwrap_or_else(|_| panic!("buffer of {} elements is not {rows}x{cols}", data.len()))
}

/// Transpose a row-major matrix (rows x cols) to (cols x rows)
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    as_matrix(data, rows, cols).t().iter().copied().collect()
}

/// Compute (m x k) @ (k x n) on raw row-major buffers
pub fn matmul_compute(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let product = as_matrix(a, m, k).dot(&as_matrix(b, k, n));
    product.iter().copied().collect()
}

/// Matrix multiplication: (m x k) @ (k x n) = (m x n)
pub fn matmul(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Tensor {
    assert_eq!(a.len(), m * k, "matmul: left operand must be {m}x{k}");
    assert_eq!(b.len(), k * n, "matmul: right operand must be {k}x{n}");

    let data = {
        let a_data = a.data();
        let b_data = b.data();
        matmul_compute(contiguous(&a_data), contiguous(&b_data), m, k, n)
    };
    let requires_grad = needs_grad(&[a, b]);

    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

/// Flat slice of a standard-layout array
pub(crate) fn contiguous(data: &Array1<f32>) -> &[f32] {
    data.as_slice().unwrap_or_else(|| panic!("tensor storage is always contiguous"))
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for MatmulBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let grad_2d = as_matrix(contiguous(grad), self.m, self.n);

            if self.a.requires_grad() {
                // ∂L/∂A = ∂L/∂C @ B^T
                let b_data = self.b.data();
                let b_2d = as_matrix(contiguous(&b_data), self.k, self.n);
                let grad_a = grad_2d.dot(&b_2d.t());
                self.a.accumulate_grad(grad_a.iter().copied().collect());
            }

            if self.b.requires_grad() {
                // ∂L/∂B = A^T @ ∂L/∂C
                let a_data = self.a.data();
                let a_2d = as_matrix(contiguous(&a_data), self.m, self.k);
                let grad_b = a_2d.t().dot(&grad_2d);
                self.b.accumulate_grad(grad_b.iter().copied().collect());
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}
