//! Attention autograd operations: causal attention weights and weighted sum
//!
//! Scaled dot-product attention is split into two differentiable steps so that
//! the attention weights exist as a tensor of their own between them:
//!
//! ```text
//! weights = causal_softmax(Q @ K^T / sqrt(d))   # attention_weights
//! output  = weights @ V                          # attend
//! ```
//!
//! Q is (seq_len x num_heads*head_dim) and K, V are
//! (seq_len x num_kv_heads*head_dim), all position-major. Weights are
//! (num_heads x seq_len x seq_len), head-major. Grouped-query attention maps
//! query head `h` onto key/value head `h / (num_heads / num_kv_heads)`.

use crate::autograd::{needs_grad, BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Geometry of one attention computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionShape {
    /// Sequence length
    pub seq_len: usize,
    /// Number of query heads
    pub num_heads: usize,
    /// Number of key/value heads
    pub num_kv_heads: usize,
    /// Per-head dimension
    pub head_dim: usize,
}

impl AttentionShape {
    fn q_width(&self) -> usize {
        self.num_heads * self.head_dim
    }

    fn kv_width(&self) -> usize {
        self.num_kv_heads * self.head_dim
    }

    fn kv_head(&self, head: usize) -> usize {
        head / (self.num_heads / self.num_kv_heads)
    }

    /// Flat index of weight `[head, query, key]`
    pub fn weight_index(&self, head: usize, query: usize, key: usize) -> usize {
        (head * self.seq_len + query) * self.seq_len + key
    }

    /// Number of elements of the weights tensor
    pub fn weights_len(&self) -> usize {
        self.num_heads * self.seq_len * self.seq_len
    }
}

/// Causal attention weights: softmax over keys `j <= i` for every query `i`
///
/// Entries above the diagonal are exactly zero.
pub fn attention_weights(q: &Tensor, k: &Tensor, shape: AttentionShape) -> Tensor {
    let AttentionShape { seq_len, num_heads, head_dim, .. } = shape;
    assert_eq!(q.len(), seq_len * shape.q_width(), "attention_weights: bad query shape");
    assert_eq!(k.len(), seq_len * shape.kv_width(), "attention_weights: bad key shape");
    assert_eq!(num_heads % shape.num_kv_heads, 0, "query heads must divide into kv heads");

    let scale = 1.0 / (head_dim as f32).sqrt();
    let mut weights = Array1::<f32>::zeros(shape.weights_len());
    {
        let q_data = q.data();
        let k_data = k.data();
        let mut scores = vec![0.0f32; seq_len];
        for h in 0..num_heads {
            let kv_h = shape.kv_head(h);
            for i in 0..seq_len {
                let q_off = i * shape.q_width() + h * head_dim;
                let q_row = q_data.slice(ndarray::s![q_off..q_off + head_dim]);
                let mut max_score = f32::NEG_INFINITY;
                for (j, score) in scores.iter_mut().enumerate().take(i + 1) {
                    let k_off = j * shape.kv_width() + kv_h * head_dim;
                    let k_row = k_data.slice(ndarray::s![k_off..k_off + head_dim]);
                    *score = q_row.dot(&k_row) * scale;
                    max_score = max_score.max(*score);
                }
                let mut sum_exp = 0.0;
                for score in scores.iter_mut().take(i + 1) {
                    *score = (*score - max_score).exp();
                    sum_exp += *score;
                }
                for (j, score) in scores.iter().enumerate().take(i + 1) {
                    weights[shape.weight_index(h, i, j)] = score / sum_exp;
                }
            }
        }
    }

    let requires_grad = needs_grad(&[q, k]);
    let mut result = Tensor::new(weights.clone(), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AttentionWeightsBackward {
            q: q.clone(),
            k: k.clone(),
            weights,
            shape,
            scale,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct AttentionWeightsBackward {
    q: Tensor,
    k: Tensor,
    weights: Array1<f32>,
    shape: AttentionShape,
    scale: f32,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for AttentionWeightsBackward {
    fn backward(&self) {
        if let Some(grad_weights) = self.result_grad.borrow().as_ref() {
            let shape = self.shape;
            let AttentionShape { seq_len, num_heads, head_dim, .. } = shape;
            let q_data = self.q.data();
            let k_data = self.k.data();
            let mut grad_q = Array1::<f32>::zeros(q_data.len());
            let mut grad_k = Array1::<f32>::zeros(k_data.len());

            for h in 0..num_heads {
                let kv_h = shape.kv_head(h);
                for i in 0..seq_len {
                    // Softmax backward on the unmasked prefix of row i:
                    // ∂L/∂s_j = w_j * (∂L/∂w_j - Σ_k w_k ∂L/∂w_k)
                    let row_dot: f32 = (0..=i)
                        .map(|j| {
                            let idx = shape.weight_index(h, i, j);
                            self.weights[idx] * grad_weights[idx]
                        })
                        .sum();
                    let q_off = i * shape.q_width() + h * head_dim;
                    for j in 0..=i {
                        let idx = shape.weight_index(h, i, j);
                        let grad_score =
                            self.weights[idx] * (grad_weights[idx] - row_dot) * self.scale;
                        if grad_score == 0.0 {
                            continue;
                        }
                        let k_off = j * shape.kv_width() + kv_h * head_dim;
                        for d in 0..head_dim {
                            grad_q[q_off + d] += grad_score * k_data[k_off + d];
                            grad_k[k_off + d] += grad_score * q_data[q_off + d];
                        }
                    }
                }
            }

            drop(q_data);
            drop(k_data);
            if self.q.requires_grad() {
                self.q.accumulate_grad(grad_q);
            }
            if self.k.requires_grad() {
                self.k.accumulate_grad(grad_k);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.q.clone(), self.k.clone()]
    }
}

/// Weighted sum of values: output[i, h] = Σ_j weights[h, i, j] * v[j, kv(h)]
///
/// Returns (seq_len x num_heads*head_dim), position-major.
pub fn attend(weights: &Tensor, v: &Tensor, shape: AttentionShape) -> Tensor {
    let AttentionShape { seq_len, num_heads, head_dim, .. } = shape;
    assert_eq!(weights.len(), shape.weights_len(), "attend: bad weights shape");
    assert_eq!(v.len(), seq_len * shape.kv_width(), "attend: bad value shape");

    let mut output = Array1::<f32>::zeros(seq_len * shape.q_width());
    {
        let w_data = weights.data();
        let v_data = v.data();
        for h in 0..num_heads {
            let kv_h = shape.kv_head(h);
            for i in 0..seq_len {
                let out_off = i * shape.q_width() + h * head_dim;
                for j in 0..seq_len {
                    let w = w_data[shape.weight_index(h, i, j)];
                    if w == 0.0 {
                        continue;
                    }
                    let v_off = j * shape.kv_width() + kv_h * head_dim;
                    for d in 0..head_dim {
                        output[out_off + d] += w * v_data[v_off + d];
                    }
                }
            }
        }
    }

    let requires_grad = needs_grad(&[weights, v]);
    let mut result = Tensor::new(output, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AttendBackward {
            weights: weights.clone(),
            v: v.clone(),
            shape,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct AttendBackward {
    weights: Tensor,
    v: Tensor,
    shape: AttentionShape,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for AttendBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            let shape = self.shape;
            let AttentionShape { seq_len, num_heads, head_dim, .. } = shape;
            let w_data = self.weights.data();
            let v_data = self.v.data();
            let mut grad_w = Array1::<f32>::zeros(w_data.len());
            let mut grad_v = Array1::<f32>::zeros(v_data.len());

            for h in 0..num_heads {
                let kv_h = shape.kv_head(h);
                for i in 0..seq_len {
                    let out_off = i * shape.q_width() + h * head_dim;
                    for j in 0..seq_len {
                        let idx = shape.weight_index(h, i, j);
                        let v_off = j * shape.kv_width() + kv_h * head_dim;
                        let mut dot = 0.0;
                        for d in 0..head_dim {
                            dot += grad_output[out_off + d] * v_data[v_off + d];
                            grad_v[v_off + d] += w_data[idx] * grad_output[out_off + d];
                        }
                        grad_w[idx] = dot;
                    }
                }
            }

            drop(w_data);
            drop(v_data);
            if self.weights.requires_grad() {
                self.weights.accumulate_grad(grad_w);
            }
            if self.v.requires_grad() {
                self.v.accumulate_grad(grad_v);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.weights.clone(), self.v.clone()]
    }
}
