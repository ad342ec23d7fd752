//! Transformer block module
//!
//! One decoder layer: normalization, attention, feed-forward and residuals.
//! GPT-2 and LLaMA use sequential residuals; GPT-J feeds a single normalized
//! input to attention and the MLP in parallel.

use super::attention::{AttentionContext, CausalSelfAttention};
use super::config::TransformerConfig;
use super::family::ModelFamily;
use super::feedforward::FeedForward;
use super::norm::{LayerNorm, Norm, RMSNorm};
use super::weights::WeightMap;
use crate::autograd::add;
use crate::error::Result;
use crate::Tensor;

/// Complete decoder block
pub struct DecoderBlock {
    family: ModelFamily,
    /// Input normalization
    pub input_norm: Norm,
    /// Self-attention
    pub self_attn: CausalSelfAttention,
    /// Normalization before the MLP (absent for parallel residual)
    pub post_attn_norm: Option<Norm>,
    /// Feed-forward network
    pub mlp: FeedForward,
}

impl DecoderBlock {
    /// Create a frozen block with deterministic weights
    pub fn new(config: &TransformerConfig, layer: usize) -> Self {
        let hidden = config.hidden_size;
        let eps = config.norm_eps;
        let salt = layer as f32;
        let (input_norm, post_attn_norm, mlp) = match config.family {
            ModelFamily::Gpt2 => (
                Norm::Layer(LayerNorm::new(hidden, eps)),
                Some(Norm::Layer(LayerNorm::new(hidden, eps))),
                FeedForward::gelu(hidden, config.intermediate_size, salt),
            ),
            ModelFamily::GptJ => (
                Norm::Layer(LayerNorm::new(hidden, eps)),
                None,
                FeedForward::gelu(hidden, config.intermediate_size, salt),
            ),
            ModelFamily::Llama => (
                Norm::Rms(RMSNorm::new(hidden, eps)),
                Some(Norm::Rms(RMSNorm::new(hidden, eps))),
                FeedForward::swiglu(hidden, config.intermediate_size, salt),
            ),
        };
        Self {
            family: config.family,
            input_norm,
            self_attn: CausalSelfAttention::new(config, layer),
            post_attn_norm,
            mlp,
        }
    }

    /// Load block `layer` from canonical names `layers.{layer}.*`
    pub fn from_weights(config: &TransformerConfig, weights: &mut WeightMap, layer: usize) -> Result<Self> {
        let prefix = format!("layers.{layer}");
        let hidden = config.hidden_size;
        let inter = config.intermediate_size;
        let eps = config.norm_eps;
        let self_attn = CausalSelfAttention::from_weights(config, weights, &format!("{prefix}.attn"), layer)?;
        let (input_norm, post_attn_norm, mlp) = match config.family {
            ModelFamily::Gpt2 => (
                Norm::Layer(LayerNorm::from_weights(weights, &format!("{prefix}.input_norm"), hidden, eps)?),
                Some(Norm::Layer(LayerNorm::from_weights(
                    weights,
                    &format!("{prefix}.post_attention_norm"),
                    hidden,
                    eps,
                )?)),
                FeedForward::gelu_from_weights(weights, &format!("{prefix}.mlp"), hidden, inter)?,
            ),
            ModelFamily::GptJ => (
                Norm::Layer(LayerNorm::from_weights(weights, &format!("{prefix}.input_norm"), hidden, eps)?),
                None,
                FeedForward::gelu_from_weights(weights, &format!("{prefix}.mlp"), hidden, inter)?,
            ),
            ModelFamily::Llama => (
                Norm::Rms(RMSNorm::from_weights(weights, &format!("{prefix}.input_norm"), hidden, eps)?),
                Some(Norm::Rms(RMSNorm::from_weights(
                    weights,
                    &format!("{prefix}.post_attention_norm"),
                    hidden,
                    eps,
                )?)),
                FeedForward::swiglu_from_weights(weights, &format!("{prefix}.mlp"), hidden, inter)?,
            ),
        };
        Ok(Self { family: config.family, input_norm, self_attn, post_attn_norm, mlp })
    }

    /// Forward pass over (seq_len x hidden_size)
    pub fn forward(&self, x: &Tensor, seq_len: usize, ctx: &AttentionContext) -> Result<Tensor> {
        let normed = self.input_norm.forward(x, seq_len);
        let attn_out = self.self_attn.forward(&normed, seq_len, ctx)?;

        match &self.post_attn_norm {
            Some(norm) => {
                let residual = add(x, &attn_out);
                let mlp_out = self.mlp.forward(&norm.forward(&residual, seq_len), seq_len);
                Ok(add(&residual, &mlp_out))
            }
            None => {
                let mlp_out = self.mlp.forward(&normed, seq_len);
                Ok(add(&add(x, &attn_out), &mlp_out))
            }
        }
    }

    /// Architecture family
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Get all frozen parameters
    pub fn parameters(&self) -> Vec<Tensor> {
        let mut params = self.input_norm.parameters();
        params.extend(self.self_attn.parameters());
        if let Some(norm) = &self.post_attn_norm {
            params.extend(norm.parameters());
        }
        params.extend(self.mlp.parameters());
        params
    }
}
