//! Feed-forward network module
//!
//! GELU MLP (GPT-2, GPT-J) and SwiGLU (LLaMA).

use super::linear::Linear;
use super::weights::WeightMap;
use crate::autograd::{gelu, mul, swish};
use crate::error::Result;
use crate::Tensor;

/// Position-wise feed-forward network
pub enum FeedForward {
    /// `fc_out(gelu(fc_in(x)))`, both projections biased
    Gelu { fc_in: Linear, fc_out: Linear },
    /// `down(silu(gate(x)) * up(x))`, no biases
    SwiGlu { gate_proj: Linear, up_proj: Linear, down_proj: Linear },
}

impl FeedForward {
    /// Deterministic GELU MLP
    pub fn gelu(hidden_size: usize, intermediate_size: usize, salt: f32) -> Self {
        FeedForward::Gelu {
            fc_in: Linear::new(hidden_size, intermediate_size, true, salt + 0.567),
            fc_out: Linear::new(intermediate_size, hidden_size, true, salt + 0.789),
        }
    }

    /// Deterministic SwiGLU MLP
    pub fn swiglu(hidden_size: usize, intermediate_size: usize, salt: f32) -> Self {
        FeedForward::SwiGlu {
            gate_proj: Linear::new(hidden_size, intermediate_size, false, salt + 0.567),
            up_proj: Linear::new(hidden_size, intermediate_size, false, salt + 0.678),
            down_proj: Linear::new(intermediate_size, hidden_size, false, salt + 0.789),
        }
    }

    /// Load `{prefix}.fc_in` / `{prefix}.fc_out`
    pub fn gelu_from_weights(
        weights: &mut WeightMap,
        prefix: &str,
        hidden_size: usize,
        intermediate_size: usize,
    ) -> Result<Self> {
        Ok(FeedForward::Gelu {
            fc_in: weights.take_linear(&format!("{prefix}.fc_in"), hidden_size, intermediate_size, true)?,
            fc_out: weights.take_linear(&format!("{prefix}.fc_out"), intermediate_size, hidden_size, true)?,
        })
    }

    /// Load `{prefix}.gate_proj` / `{prefix}.up_proj` / `{prefix}.down_proj`
    pub fn swiglu_from_weights(
        weights: &mut WeightMap,
        prefix: &str,
        hidden_size: usize,
        intermediate_size: usize,
    ) -> Result<Self> {
        Ok(FeedForward::SwiGlu {
            gate_proj: weights.take_linear(&format!("{prefix}.gate_proj"), hidden_size, intermediate_size, false)?,
            up_proj: weights.take_linear(&format!("{prefix}.up_proj"), hidden_size, intermediate_size, false)?,
            down_proj: weights.take_linear(&format!("{prefix}.down_proj"), intermediate_size, hidden_size, false)?,
        })
    }

    /// Forward pass over `seq_len` positions
    pub fn forward(&self, x: &Tensor, seq_len: usize) -> Tensor {
        match self {
            FeedForward::Gelu { fc_in, fc_out } => {
                let hidden = gelu(&fc_in.forward(x, seq_len));
                fc_out.forward(&hidden, seq_len)
            }
            FeedForward::SwiGlu { gate_proj, up_proj, down_proj } => {
                let gate = swish(&gate_proj.forward(x, seq_len));
                let up = up_proj.forward(x, seq_len);
                down_proj.forward(&mul(&gate, &up), seq_len)
            }
        }
    }

    /// All parameter tensors
    pub fn parameters(&self) -> Vec<Tensor> {
        match self {
            FeedForward::Gelu { fc_in, fc_out } => [fc_in, fc_out].iter().flat_map(|l| l.parameters()).collect(),
            FeedForward::SwiGlu { gate_proj, up_proj, down_proj } => {
                [gate_proj, up_proj, down_proj].iter().flat_map(|l| l.parameters()).collect()
            }
        }
    }
}
