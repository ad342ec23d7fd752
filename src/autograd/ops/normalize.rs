//! Normalization autograd operations: layer_norm, rms_norm
//!
//! Both operate row-wise on a (rows x cols) matrix with per-column scale.

use crate::autograd::{needs_grad, BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Layer Normalization over each row
///
/// LayerNorm(x) = gamma * (x - mean) / sqrt(var + epsilon) + beta
pub fn layer_norm(
    x: &Tensor,
    gamma: &Tensor,
    beta: &Tensor,
    rows: usize,
    cols: usize,
    epsilon: f32,
) -> Tensor {
    assert_eq!(x.len(), rows * cols, "layer_norm: input must be {rows}x{cols}");
    assert_eq!(gamma.len(), cols, "layer_norm: gamma must have {cols} elements");
    assert_eq!(beta.len(), cols, "layer_norm: beta must have {cols} elements");

    let mut normalized = Array1::<f32>::zeros(rows * cols);
    let mut inv_std = Vec::with_capacity(rows);
    let mut data = Array1::<f32>::zeros(rows * cols);
    {
        let x_data = x.data();
        let gamma_data = gamma.data();
        let beta_data = beta.data();
        for r in 0..rows {
            let row = x_data.slice(ndarray::s![r * cols..(r + 1) * cols]);
            let mean = row.sum() / cols as f32;
            let variance = row.mapv(|v| (v - mean).powi(2)).sum() / cols as f32;
            let inv = 1.0 / (variance + epsilon).sqrt();
            inv_std.push(inv);
            for c in 0..cols {
                let xhat = (row[c] - mean) * inv;
                normalized[r * cols + c] = xhat;
                data[r * cols + c] = xhat * gamma_data[c] + beta_data[c];
            }
        }
    }

    let requires_grad = needs_grad(&[x, gamma, beta]);
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(LayerNormBackward {
            x: x.clone(),
            gamma: gamma.clone(),
            beta: beta.clone(),
            normalized,
            inv_std,
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct LayerNormBackward {
    x: Tensor,
    gamma: Tensor,
    beta: Tensor,
    normalized: Array1<f32>,
    inv_std: Vec<f32>,
    cols: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for LayerNormBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            let cols = self.cols;

            if self.beta.requires_grad() {
                let mut grad_beta = Array1::<f32>::zeros(cols);
                for (i, g) in grad_output.iter().enumerate() {
                    grad_beta[i % cols] += g;
                }
                self.beta.accumulate_grad(grad_beta);
            }

            if self.gamma.requires_grad() {
                let mut grad_gamma = Array1::<f32>::zeros(cols);
                for (i, (g, xhat)) in grad_output.iter().zip(self.normalized.iter()).enumerate() {
                    grad_gamma[i % cols] += g * xhat;
                }
                self.gamma.accumulate_grad(grad_gamma);
            }

            if self.x.requires_grad() {
                // ∂L/∂x = inv_std * (dxhat - mean(dxhat) - xhat * mean(dxhat * xhat))
                let gamma = self.gamma.data();
                let mut grad_x = Array1::<f32>::zeros(grad_output.len());
                for (r, &inv) in self.inv_std.iter().enumerate() {
                    let base = r * cols;
                    let dxhat: Vec<f32> =
                        (0..cols).map(|c| grad_output[base + c] * gamma[c]).collect();
                    let mean_dxhat = dxhat.iter().sum::<f32>() / cols as f32;
                    let mean_dxhat_xhat = (0..cols)
                        .map(|c| dxhat[c] * self.normalized[base + c])
                        .sum::<f32>()
                        / cols as f32;
                    for c in 0..cols {
                        grad_x[base + c] = inv
                            * (dxhat[c] - mean_dxhat - self.normalized[base + c] * mean_dxhat_xhat);
                    }
                }
                self.x.accumulate_grad(grad_x);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone(), self.gamma.clone(), self.beta.clone()]
    }
}

/// RMS Normalization over each row
///
/// RMSNorm(x) = gamma * x / sqrt(mean(x²) + epsilon)
pub fn rms_norm(x: &Tensor, gamma: &Tensor, rows: usize, cols: usize, epsilon: f32) -> Tensor {
    assert_eq!(x.len(), rows * cols, "rms_norm: input must be {rows}x{cols}");
    assert_eq!(gamma.len(), cols, "rms_norm: gamma must have {cols} elements");

    let mut normalized = Array1::<f32>::zeros(rows * cols);
    let mut inv_rms = Vec::with_capacity(rows);
    let mut data = Array1::<f32>::zeros(rows * cols);
    {
        let x_data = x.data();
        let gamma_data = gamma.data();
        for r in 0..rows {
            let row = x_data.slice(ndarray::s![r * cols..(r + 1) * cols]);
            let mean_sq = row.mapv(|v| v * v).sum() / cols as f32;
            let inv = 1.0 / (mean_sq + epsilon).sqrt();
            inv_rms.push(inv);
            for c in 0..cols {
                let xn = row[c] * inv;
                normalized[r * cols + c] = xn;
                data[r * cols + c] = xn * gamma_data[c];
            }
        }
    }

    let requires_grad = needs_grad(&[x, gamma]);
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(RmsNormBackward {
            x: x.clone(),
            gamma: gamma.clone(),
            normalized,
            inv_rms,
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct RmsNormBackward {
    x: Tensor,
    gamma: Tensor,
    normalized: Array1<f32>,
    inv_rms: Vec<f32>,
    cols: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for RmsNormBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            let cols = self.cols;

            if self.gamma.requires_grad() {
                let mut grad_gamma = Array1::<f32>::zeros(cols);
                for (i, (g, xn)) in grad_output.iter().zip(self.normalized.iter()).enumerate() {
                    grad_gamma[i % cols] += g * xn;
                }
                self.gamma.accumulate_grad(grad_gamma);
            }

            if self.x.requires_grad() {
                // ∂L/∂x = inv_rms * (dxn - xn * mean(dxn * xn))
                let gamma = self.gamma.data();
                let mut grad_x = Array1::<f32>::zeros(grad_output.len());
                for (r, &inv) in self.inv_rms.iter().enumerate() {
                    let base = r * cols;
                    let dxn: Vec<f32> =
                        (0..cols).map(|c| grad_output[base + c] * gamma[c]).collect();
                    let mean_dot = (0..cols)
                        .map(|c| dxn[c] * self.normalized[base + c])
                        .sum::<f32>()
                        / cols as f32;
                    for c in 0..cols {
                        grad_x[base + c] = inv * (dxn[c] - self.normalized[base + c] * mean_dot);
                    }
                }
                self.x.accumulate_grad(grad_x);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone(), self.gamma.clone()]
    }
}
