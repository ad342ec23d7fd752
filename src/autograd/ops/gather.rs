//! Index selection with scatter-add backward

use crate::autograd::{needs_grad, BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Select elements of `x` at `indices` (repeats allowed)
pub fn gather(x: &Tensor, indices: &[usize]) -> Tensor {
    let data: Array1<f32> = {
        let x_data = x.data();
        indices.iter().map(|&i| x_data[i]).collect()
    };

    let requires_grad = needs_grad(&[x]);
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(GatherBackward {
            x: x.clone(),
            indices: indices.to_vec(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

/// Select whole rows of a (rows x cols) matrix
pub fn gather_rows(x: &Tensor, rows: &[usize], cols: usize) -> Tensor {
    let indices: Vec<usize> = rows.iter().flat_map(|&r| r * cols..(r + 1) * cols).collect();
    gather(x, &indices)
}

struct GatherBackward {
    x: Tensor,
    indices: Vec<usize>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for GatherBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                let mut grad_x = Array1::<f32>::zeros(self.x.len());
                for (&i, g) in self.indices.iter().zip(grad.iter()) {
                    grad_x[i] += g;
                }
                self.x.accumulate_grad(grad_x);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone()]
    }
}
