//! Normalization layers
//!
//! GPT-2 and GPT-J use LayerNorm with a bias; LLaMA uses RMSNorm.

use super::weights::WeightMap;
use crate::autograd::{layer_norm, rms_norm};
use crate::error::Result;
use crate::Tensor;

/// Layer normalization with affine parameters
pub struct LayerNorm {
    /// Scale (hidden_size)
    pub weight: Tensor,
    /// Shift (hidden_size)
    pub bias: Tensor,
    hidden_size: usize,
    eps: f32,
}

impl LayerNorm {
    /// Identity-initialized layer
    pub fn new(hidden_size: usize, eps: f32) -> Self {
        Self {
            weight: Tensor::from_vec(vec![1.0; hidden_size], false),
            bias: Tensor::zeros(hidden_size, false),
            hidden_size,
            eps,
        }
    }

    /// Load `{prefix}.weight` and `{prefix}.bias`
    pub fn from_weights(
        weights: &mut WeightMap,
        prefix: &str,
        hidden_size: usize,
        eps: f32,
    ) -> Result<Self> {
        Ok(Self {
            weight: weights.take(&format!("{prefix}.weight"), hidden_size)?,
            bias: weights.take(&format!("{prefix}.bias"), hidden_size)?,
            hidden_size,
            eps,
        })
    }

    /// Normalize each of `rows` rows
    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        layer_norm(x, &self.weight, &self.bias, rows, self.hidden_size, self.eps)
    }
}

/// RMS Normalization layer
pub struct RMSNorm {
    /// Weight (scale) parameter
    pub weight: Tensor,
    hidden_size: usize,
    eps: f32,
}

impl RMSNorm {
    /// Create new RMS normalization layer
    pub fn new(hidden_size: usize, eps: f32) -> Self {
        Self { weight: Tensor::from_vec(vec![1.0; hidden_size], false), hidden_size, eps }
    }

    /// Load `{prefix}.weight`
    pub fn from_weights(
        weights: &mut WeightMap,
        prefix: &str,
        hidden_size: usize,
        eps: f32,
    ) -> Result<Self> {
        Ok(Self { weight: weights.take(&format!("{prefix}.weight"), hidden_size)?, hidden_size, eps })
    }

    /// RMSNorm(x) = x / sqrt(mean(x^2) + eps) * weight, per row
    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        rms_norm(x, &self.weight, rows, self.hidden_size, self.eps)
    }
}

/// Normalization used by a model family
pub enum Norm {
    Layer(LayerNorm),
    Rms(RMSNorm),
}

impl Norm {
    /// Row-wise forward pass
    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        match self {
            Norm::Layer(norm) => norm.forward(x, rows),
            Norm::Rms(norm) => norm.forward(x, rows),
        }
    }

    /// All parameter tensors
    pub fn parameters(&self) -> Vec<Tensor> {
        match self {
            Norm::Layer(norm) => vec![norm.weight.clone(), norm.bias.clone()],
            Norm::Rms(norm) => vec![norm.weight.clone()],
        }
    }
}
