//! Rotary position embedding as an autograd operation

use crate::autograd::{needs_grad, BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// How rotary dimensions are paired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotaryStyle {
    /// Adjacent dimensions `(2i, 2i+1)` rotate together (GPT-J)
    Interleaved,
    /// Dimension `i` rotates with `i + rotary_dim/2` (LLaMA)
    HalfSplit,
}

/// Rotary embedding parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotary {
    /// Pairing of rotated dimensions
    pub style: RotaryStyle,
    /// Leading dimensions of each head that are rotated
    pub rotary_dim: usize,
    /// Frequency base
    pub theta: f32,
}

impl Rotary {
    fn pair(&self, i: usize) -> (usize, usize) {
        match self.style {
            RotaryStyle::Interleaved => (2 * i, 2 * i + 1),
            RotaryStyle::HalfSplit => (i, i + self.rotary_dim / 2),
        }
    }

    fn angle(&self, position: usize, i: usize) -> f32 {
        let inv_freq = self.theta.powf(-((2 * i) as f32) / self.rotary_dim as f32);
        position as f32 * inv_freq
    }

    /// Rotate (in place) every head of a (seq_len x num_heads*head_dim) buffer
    fn rotate(&self, data: &mut Array1<f32>, seq_len: usize, num_heads: usize, head_dim: usize, sign: f32) {
        let width = num_heads * head_dim;
        for p in 0..seq_len {
            for i in 0..self.rotary_dim / 2 {
                let (sin, cos) = (sign * self.angle(p, i)).sin_cos();
                let (da, db) = self.pair(i);
                for h in 0..num_heads {
                    let base = p * width + h * head_dim;
                    let a = data[base + da];
                    let b = data[base + db];
                    data[base + da] = a * cos - b * sin;
                    data[base + db] = a * sin + b * cos;
                }
            }
        }
    }
}

/// Apply rotary position embedding to queries or keys
pub fn rotary_embedding(
    x: &Tensor,
    rotary: Rotary,
    seq_len: usize,
    num_heads: usize,
    head_dim: usize,
) -> Tensor {
    assert_eq!(x.len(), seq_len * num_heads * head_dim, "rotary_embedding: bad input shape");
    assert!(rotary.rotary_dim <= head_dim && rotary.rotary_dim % 2 == 0, "rotary_dim must be even and <= head_dim");

    let mut data = x.data().clone();
    rotary.rotate(&mut data, seq_len, num_heads, head_dim, 1.0);

    let requires_grad = needs_grad(&[x]);
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(RotaryBackward {
            x: x.clone(),
            rotary,
            seq_len,
            num_heads,
            head_dim,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct RotaryBackward {
    x: Tensor,
    rotary: Rotary,
    seq_len: usize,
    num_heads: usize,
    head_dim: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for RotaryBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                // Rotation is orthogonal: the gradient rotates by the negative angle
                let mut grad_x = grad.clone();
                self.rotary.rotate(&mut grad_x, self.seq_len, self.num_heads, self.head_dim, -1.0);
                self.x.accumulate_grad(grad_x);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone()]
    }
}
