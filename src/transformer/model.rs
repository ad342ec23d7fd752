//! Complete causal language model
//!
//! Every base parameter is frozen (`requires_grad = false`). Gradients only
//! reach tensors introduced through the attention adapter slots.

use super::attention::{AttentionContext, CausalSelfAttention};
use super::block::DecoderBlock;
use super::config::TransformerConfig;
use super::embedding::Embedding;
use super::family::ModelFamily;
use super::linear::Linear;
use super::norm::{LayerNorm, Norm, RMSNorm};
use super::weights::WeightMap;
use crate::autograd::{add, gather, gather_rows, transpose};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::Tensor;

/// Decoder-only transformer with a language-model head
pub struct CausalLm {
    config: TransformerConfig,
    device: Device,
    /// Token embedding layer
    pub embed_tokens: Embedding,
    /// Learned position embedding (GPT-2 only)
    pub embed_positions: Option<Embedding>,
    /// Decoder layers
    pub layers: Vec<DecoderBlock>,
    /// Final normalization
    pub final_norm: Norm,
    /// Language model head (hidden_size x vocab_size)
    pub lm_head: Linear,
}

impl CausalLm {
    /// Create a model with deterministic synthetic weights
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if the configuration is inconsistent.
    pub fn new(config: &TransformerConfig, device: Device) -> Result<Self> {
        config.validate()?;
        let hidden = config.hidden_size;
        let embed_tokens = Embedding::new(config.vocab_size, hidden, 0.111);
        let embed_positions = (config.family == ModelFamily::Gpt2)
            .then(|| Embedding::new(config.max_position_embeddings, hidden, 0.222));
        let final_norm = match config.family {
            ModelFamily::Llama => Norm::Rms(RMSNorm::new(hidden, config.norm_eps)),
            _ => Norm::Layer(LayerNorm::new(hidden, config.norm_eps)),
        };
        let lm_head = if config.tie_word_embeddings {
            tied_head(&embed_tokens)?
        } else {
            Linear::new(hidden, config.vocab_size, config.family == ModelFamily::GptJ, 0.999)
        };

        Ok(Self {
            config: config.clone(),
            device,
            embed_tokens,
            embed_positions,
            layers: (0..config.num_hidden_layers).map(|i| DecoderBlock::new(config, i)).collect(),
            final_norm,
            lm_head,
        })
    }

    /// Assemble a model from canonical weight names
    ///
    /// Expected names:
    /// - `embed_tokens`, `embed_positions` (GPT-2)
    /// - `layers.{i}.*`
    /// - `final_norm.weight` (and `.bias` for LayerNorm)
    /// - `lm_head.weight` (unless tied), `lm_head.bias` (GPT-J)
    ///
    /// # Errors
    /// Returns an error for missing or mis-sized tensors.
    pub fn from_weights(config: &TransformerConfig, device: Device, mut weights: WeightMap) -> Result<Self> {
        config.validate()?;
        let hidden = config.hidden_size;
        let embed_tokens = Embedding::from_weights(&mut weights, "embed_tokens", config.vocab_size, hidden)?;
        let embed_positions = if config.family == ModelFamily::Gpt2 {
            Some(Embedding::from_weights(
                &mut weights,
                "embed_positions",
                config.max_position_embeddings,
                hidden,
            )?)
        } else {
            None
        };
        let layers = (0..config.num_hidden_layers)
            .map(|i| DecoderBlock::from_weights(config, &mut weights, i))
            .collect::<Result<Vec<_>>>()?;
        let final_norm = match config.family {
            ModelFamily::Llama => Norm::Rms(RMSNorm::from_weights(&mut weights, "final_norm", hidden, config.norm_eps)?),
            _ => Norm::Layer(LayerNorm::from_weights(&mut weights, "final_norm", hidden, config.norm_eps)?),
        };
        let lm_head = if config.tie_word_embeddings || !weights.contains("lm_head.weight") {
            tied_head(&embed_tokens)?
        } else {
            weights.take_linear("lm_head", hidden, config.vocab_size, config.family == ModelFamily::GptJ)?
        };

        if !weights.is_empty() {
            tracing::debug!(unused = weights.len(), "ignoring tensors not used by the model");
        }

        Ok(Self {
            config: config.clone(),
            device,
            embed_tokens,
            embed_positions,
            layers,
            final_norm,
            lm_head,
        })
    }

    /// Final hidden state of every position (seq_len x hidden_size)
    pub fn forward_hidden(&self, token_ids: &[u32], ctx: &AttentionContext) -> Result<Tensor> {
        let seq_len = token_ids.len();
        if seq_len == 0 {
            return Err(Error::shape("prompt length", 1, 0));
        }
        if seq_len > self.config.max_position_embeddings {
            return Err(Error::shape("prompt length", self.config.max_position_embeddings, seq_len));
        }

        let mut hidden = self.embed_tokens.forward(token_ids)?;
        if let Some(positions) = &self.embed_positions {
            let ids: Vec<u32> = (0..seq_len as u32).collect();
            hidden = add(&hidden, &positions.forward(&ids)?);
        }
        for layer in &self.layers {
            hidden = layer.forward(&hidden, seq_len, ctx)?;
        }
        Ok(hidden)
    }

    /// Next-token logits at `ctx.query_position` (vocab_size)
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the prompt is empty or too long, or
    /// if a context position lies outside the prompt.
    pub fn forward(&self, token_ids: &[u32], ctx: &AttentionContext) -> Result<Tensor> {
        let seq_len = token_ids.len();
        if ctx.query_position >= seq_len {
            return Err(Error::shape("query position", seq_len.saturating_sub(1), ctx.query_position));
        }
        if let Some(&anchor) = ctx.anchor_positions.iter().find(|&&p| p > ctx.query_position) {
            return Err(Error::shape("anchor position", ctx.query_position, anchor));
        }

        let hidden = self.forward_hidden(token_ids, ctx)?;
        let last = gather_rows(&hidden, &[ctx.query_position], self.config.hidden_size);
        let normed = self.final_norm.forward(&last, 1);
        Ok(self.lm_head.forward(&normed, 1))
    }

    /// Logits restricted to `label_ids`, in that order
    pub fn label_logits(&self, token_ids: &[u32], ctx: &AttentionContext, label_ids: &[u32]) -> Result<Tensor> {
        let vocab = self.config.vocab_size;
        if let Some(&bad) = label_ids.iter().find(|&&id| id as usize >= vocab) {
            return Err(Error::shape("label token id", vocab, bad as usize));
        }
        let logits = self.forward(token_ids, ctx)?;
        let indices: Vec<usize> = label_ids.iter().map(|&id| id as usize).collect();
        Ok(gather(&logits, &indices))
    }

    /// Attention layers in stack order
    pub fn attention_layers(&self) -> impl Iterator<Item = &CausalSelfAttention> {
        self.layers.iter().map(|layer| &layer.self_attn)
    }

    /// Mutable attention layers in stack order
    pub fn attention_layers_mut(&mut self) -> impl Iterator<Item = &mut CausalSelfAttention> {
        self.layers.iter_mut().map(|layer| &mut layer.self_attn)
    }

    /// Number of decoder layers
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Architecture family
    pub fn family(&self) -> ModelFamily {
        self.config.family
    }

    /// Device the model lives on
    pub fn device(&self) -> Device {
        self.device
    }

    /// Model configuration
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// All frozen base parameters
    pub fn parameters(&self) -> Vec<Tensor> {
        let mut params = vec![self.embed_tokens.weight.clone()];
        if let Some(positions) = &self.embed_positions {
            params.push(positions.weight.clone());
        }
        for layer in &self.layers {
            params.extend(layer.parameters());
        }
        params.extend(self.final_norm.parameters());
        params.extend(self.lm_head.parameters());
        params
    }
}

fn tied_head(embed: &Embedding) -> Result<Linear> {
    let weight = transpose(&embed.weight.to_vec(), embed.num_embeddings(), embed.hidden_size());
    Linear::from_tensors(Tensor::from_vec(weight, false), None, embed.hidden_size(), embed.num_embeddings())
}
