//! Attention adapter: learned reweighting of query-to-anchor attention
//!
//! For a layer with `num_heads` heads split into `head_count` groups and a
//! prompt with `n_demo` demonstrations, the adapter owns one trainable tensor
//! `w` of shape `[head_count, n_demo]`, zero at construction. In Active mode
//! the attention weight from the query position to anchor `j` in head `h` is
//! multiplied by `exp(w[h / (num_heads / head_count), j])`. Nothing else in the
//! weights tensor changes and rows are not renormalized.

use super::mode::{AdapterMode, ModeHandle};
use crate::autograd::{needs_grad, AttentionShape, BackwardOp};
use crate::error::{Error, Result};
use crate::transformer::AttentionContext;
use crate::Tensor;
use ndarray::Array1;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Trainable reweighting module for one attention layer
pub struct AttentionAdapter {
    layer: usize,
    num_heads: usize,
    head_count: usize,
    n_demo: usize,
    weight: Tensor,
    mode: ModeHandle,
}

impl AttentionAdapter {
    /// Create an adapter with `w = 0`
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleAdapter`] if `n_demo` or `head_count` is
    /// zero, or if `head_count` does not divide `num_heads`.
    pub fn new(
        layer: usize,
        num_heads: usize,
        head_count: usize,
        n_demo: usize,
        mode: ModeHandle,
    ) -> Result<Self> {
        let reject = |reason: String| Err(Error::IncompatibleAdapter { layer, reason });
        if n_demo == 0 {
            return reject("demonstration count must be positive".into());
        }
        if head_count == 0 {
            return reject("head count must be positive".into());
        }
        if num_heads % head_count != 0 {
            return reject(format!("{num_heads} attention heads cannot be split into {head_count} groups"));
        }

        Ok(Self {
            layer,
            num_heads,
            head_count,
            n_demo,
            weight: Tensor::zeros(head_count * n_demo, true),
            mode,
        })
    }

    /// Reweight (or pass through) one layer's attention weights
    ///
    /// `weights` is `[num_heads, seq_len, seq_len]`, head-major, as produced by
    /// [`attention_weights`](crate::autograd::attention_weights).
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] in Active mode if the context does not
    /// carry exactly `n_demo` anchors, or if a position or the head count
    /// disagrees with `shape`.
    pub fn apply(&self, weights: &Tensor, shape: AttentionShape, ctx: &AttentionContext) -> Result<Tensor> {
        if self.mode.get() == AdapterMode::Bypassed {
            return Ok(weights.clone());
        }

        if shape.num_heads != self.num_heads {
            return Err(Error::shape(format!("adapter heads (layer {})", self.layer), self.num_heads, shape.num_heads));
        }
        if ctx.anchor_positions.len() != self.n_demo {
            return Err(Error::shape(
                format!("adapter anchors (layer {})", self.layer),
                self.n_demo,
                ctx.anchor_positions.len(),
            ));
        }
        let last = shape.seq_len.saturating_sub(1);
        if let Some(&pos) = std::iter::once(&ctx.query_position)
            .chain(&ctx.anchor_positions)
            .find(|&&p| p >= shape.seq_len)
        {
            return Err(Error::shape(format!("adapter position (layer {})", self.layer), last, pos));
        }

        let heads_per_group = self.num_heads / self.head_count;
        let w = self.weight.data();

        // (weights index, w index) for every reweighted entry
        let touched: Vec<(usize, usize)> = (0..self.num_heads)
            .flat_map(|h| {
                let group = h / heads_per_group;
                ctx.anchor_positions.iter().enumerate().map(move |(j, &anchor)| {
                    (shape.weight_index(h, ctx.query_position, anchor), group * self.n_demo + j)
                })
            })
            .collect();

        let mut factors: BTreeMap<usize, f32> = BTreeMap::new();
        for &(idx, w_idx) in &touched {
            *factors.entry(idx).or_insert(1.0) *= w[w_idx].exp();
        }
        drop(w);

        let mut output = weights.data().clone();
        for (&idx, &factor) in &factors {
            output[idx] *= factor;
        }

        let requires_grad = needs_grad(&[weights, &self.weight]);
        let touched_values: Vec<f32> = touched.iter().map(|&(idx, _)| output[idx]).collect();
        let mut result = Tensor::new(output, requires_grad);

        if requires_grad {
            let backward_op = Rc::new(ReweightBackward {
                weights: weights.clone(),
                w: self.weight.clone(),
                touched,
                touched_values,
                factors,
                result_grad: result.grad_cell(),
            });
            result.set_backward_op(backward_op);
        }

        Ok(result)
    }

    /// Trainable parameter `[head_count * n_demo]`, shared storage
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Mode currently seen by this adapter
    pub fn mode(&self) -> AdapterMode {
        self.mode.get()
    }

    /// Layer this adapter is attached to
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Number of head groups
    pub fn head_count(&self) -> usize {
        self.head_count
    }

    /// Number of demonstrations
    pub fn n_demo(&self) -> usize {
        self.n_demo
    }
}

/// out[idx] = in[idx] * Π exp(w[..]) at reweighted entries, identity elsewhere
struct ReweightBackward {
    weights: Tensor,
    w: Tensor,
    touched: Vec<(usize, usize)>,
    touched_values: Vec<f32>,
    factors: BTreeMap<usize, f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for ReweightBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            if self.weights.requires_grad() {
                let mut grad_in = grad_output.clone();
                for (&idx, &factor) in &self.factors {
                    grad_in[idx] *= factor;
                }
                self.weights.accumulate_grad(grad_in);
            }

            if self.w.requires_grad() {
                // ∂out[idx]/∂w[k] = out[idx] for every factor exp(w[k]) applied at idx
                let mut grad_w = Array1::<f32>::zeros(self.w.len());
                for (&(idx, w_idx), &value) in self.touched.iter().zip(&self.touched_values) {
                    grad_w[w_idx] += grad_output[idx] * value;
                }
                self.w.accumulate_grad(grad_w);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.weights.clone(), self.w.clone()]
    }
}
