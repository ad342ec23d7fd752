//! Tape-based autograd engine
//!
//! Provides reverse-mode differentiation over flat `f32` tensors. Each op
//! records a [`BackwardOp`] on its result; [`backward`] walks the recorded
//! graph in topological order so shared sub-graphs are visited once.
//!
//! ```
//! use atencion::autograd::{backward, mul, sum, Tensor};
//!
//! let w = Tensor::from_vec(vec![2.0, 3.0], true);
//! let x = Tensor::from_vec(vec![1.0, 4.0], false);
//! let loss = sum(&mul(&w, &x));
//! backward(&loss, None);
//! assert_eq!(w.grad().unwrap().to_vec(), vec![1.0, 4.0]);
//! ```

mod backward;
mod context;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::BackwardOp;
pub use context::{is_grad_enabled, no_grad, NoGradGuard};
pub(crate) use context::needs_grad;
pub use ops::*;
pub use tensor::Tensor;

/// Perform backward pass from `tensor`
///
/// With `grad_output = None` the seed gradient is all ones, which is the
/// usual choice for a scalar loss.
pub fn backward(tensor: &Tensor, grad_output: Option<ndarray::Array1<f32>>) {
    let seed = grad_output.unwrap_or_else(|| ndarray::Array1::ones(tensor.len()));
    tensor.set_grad(seed);

    for op in backward::topological_order(tensor) {
        op.backward();
    }
}
