//! Transformer configuration module
//!
//! This module provides configuration structures for the supported decoder
//! families, including presets matching the published checkpoints.

use super::family::ModelFamily;
use crate::autograd::{Rotary, RotaryStyle};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for transformer models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Architecture family
    pub family: ModelFamily,
    /// Hidden dimension (embedding size)
    pub hidden_size: usize,
    /// Number of attention heads
    pub num_attention_heads: usize,
    /// Number of key-value heads (for grouped-query attention)
    pub num_kv_heads: usize,
    /// Feed-forward network intermediate dimension
    pub intermediate_size: usize,
    /// Number of transformer layers
    pub num_hidden_layers: usize,
    /// Vocabulary size
    pub vocab_size: usize,
    /// Maximum sequence length
    pub max_position_embeddings: usize,
    /// Normalization epsilon (LayerNorm or RMSNorm)
    pub norm_eps: f32,
    /// RoPE theta base
    pub rope_theta: f32,
    /// Rotated dimensions per head (`None` for learned positions)
    pub rotary_dim: Option<usize>,
    /// Whether the LM head reuses the token embedding matrix
    pub tie_word_embeddings: bool,
}

impl TransformerConfig {
    /// GPT-2 XL configuration
    pub fn gpt2_xl() -> Self {
        Self {
            family: ModelFamily::Gpt2,
            hidden_size: 1600,
            num_attention_heads: 25,
            num_kv_heads: 25,
            intermediate_size: 6400,
            num_hidden_layers: 48,
            vocab_size: 50257,
            max_position_embeddings: 1024,
            norm_eps: 1e-5,
            rope_theta: 10000.0,
            rotary_dim: None,
            tie_word_embeddings: true,
        }
    }

    /// GPT-J 6B configuration
    pub fn gpt_j_6b() -> Self {
        Self {
            family: ModelFamily::GptJ,
            hidden_size: 4096,
            num_attention_heads: 16,
            num_kv_heads: 16,
            intermediate_size: 16384,
            num_hidden_layers: 28,
            vocab_size: 50400,
            max_position_embeddings: 2048,
            norm_eps: 1e-5,
            rope_theta: 10000.0,
            rotary_dim: Some(64),
            tie_word_embeddings: false,
        }
    }

    /// LLaMA 2 7B configuration
    pub fn llama2_7b() -> Self {
        Self {
            family: ModelFamily::Llama,
            hidden_size: 4096,
            num_attention_heads: 32,
            num_kv_heads: 32,
            intermediate_size: 11008,
            num_hidden_layers: 32,
            vocab_size: 32000,
            max_position_embeddings: 4096,
            norm_eps: 1e-5,
            rope_theta: 10000.0,
            rotary_dim: Some(128),
            tie_word_embeddings: false,
        }
    }

    /// Published configuration of a family
    pub fn preset(family: ModelFamily) -> Self {
        match family {
            ModelFamily::Gpt2 => Self::gpt2_xl(),
            ModelFamily::GptJ => Self::gpt_j_6b(),
            ModelFamily::Llama => Self::llama2_7b(),
        }
    }

    /// Tiny configuration of a family (for testing and synthetic runs)
    pub fn tiny(family: ModelFamily, vocab_size: usize) -> Self {
        let (num_kv_heads, rotary_dim) = match family {
            ModelFamily::Gpt2 => (4, None),
            ModelFamily::GptJ => (4, Some(4)),
            ModelFamily::Llama => (2, Some(8)),
        };
        Self {
            family,
            hidden_size: 32,
            num_attention_heads: 4,
            num_kv_heads,
            intermediate_size: 64,
            num_hidden_layers: 2,
            vocab_size,
            max_position_embeddings: 512,
            norm_eps: 1e-5,
            rope_theta: 10000.0,
            rotary_dim,
            tie_word_embeddings: family == ModelFamily::Gpt2,
        }
    }

    /// Per-head dimension
    pub fn head_dim(&self) -> usize {
        self.hidden_size / self.num_attention_heads
    }

    /// Rotary embedding of the family, if it uses one
    pub fn rotary(&self) -> Option<Rotary> {
        let style = match self.family {
            ModelFamily::Gpt2 => return None,
            ModelFamily::GptJ => RotaryStyle::Interleaved,
            ModelFamily::Llama => RotaryStyle::HalfSplit,
        };
        Some(Rotary {
            style,
            rotary_dim: self.rotary_dim.unwrap_or_else(|| self.head_dim()),
            theta: self.rope_theta,
        })
    }

    /// Check internal consistency
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::ConfigError(msg));
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            return fail(format!(
                "hidden_size {} is not divisible by num_attention_heads {}",
                self.hidden_size, self.num_attention_heads
            ));
        }
        if self.num_kv_heads == 0 || self.num_attention_heads % self.num_kv_heads != 0 {
            return fail(format!(
                "num_attention_heads {} is not divisible by num_kv_heads {}",
                self.num_attention_heads, self.num_kv_heads
            ));
        }
        if let Some(rotary) = self.rotary() {
            if rotary.rotary_dim % 2 != 0 || rotary.rotary_dim > self.head_dim() {
                return fail(format!(
                    "rotary_dim {} must be even and at most head_dim {}",
                    rotary.rotary_dim,
                    self.head_dim()
                ));
            }
        }
        if self.num_hidden_layers == 0 || self.vocab_size == 0 {
            return fail("model must have at least one layer and a non-empty vocabulary".into());
        }
        Ok(())
    }

    /// Parse a HuggingFace `config.json` for the given family
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if a required key is missing.
    pub fn from_hf_config(family: ModelFamily, json: &Value) -> Result<Self> {
        let get = |key: &str| -> Result<usize> {
            json.get(key)
                .and_then(Value::as_u64)
                .map(|v| v as usize)
                .ok_or_else(|| Error::ConfigError(format!("config.json is missing '{key}'")))
        };
        let get_f32 = |key: &str, default: f32| {
            json.get(key).and_then(Value::as_f64).map_or(default, |v| v as f32)
        };

        let config = match family {
            ModelFamily::Gpt2 | ModelFamily::GptJ => {
                let hidden_size = get("n_embd")?;
                let num_attention_heads = get("n_head")?;
                Self {
                    family,
                    hidden_size,
                    num_attention_heads,
                    num_kv_heads: num_attention_heads,
                    intermediate_size: get("n_inner").unwrap_or(4 * hidden_size),
                    num_hidden_layers: get("n_layer")?,
                    vocab_size: get("vocab_size")?,
                    max_position_embeddings: get("n_positions")?,
                    norm_eps: get_f32("layer_norm_epsilon", 1e-5),
                    rope_theta: 10000.0,
                    rotary_dim: if family == ModelFamily::GptJ { get("rotary_dim").ok() } else { None },
                    tie_word_embeddings: family == ModelFamily::Gpt2,
                }
            }
            ModelFamily::Llama => {
                let num_attention_heads = get("num_attention_heads")?;
                Self {
                    family,
                    hidden_size: get("hidden_size")?,
                    num_attention_heads,
                    num_kv_heads: get("num_key_value_heads").unwrap_or(num_attention_heads),
                    intermediate_size: get("intermediate_size")?,
                    num_hidden_layers: get("num_hidden_layers")?,
                    vocab_size: get("vocab_size")?,
                    max_position_embeddings: get("max_position_embeddings")?,
                    norm_eps: get_f32("rms_norm_eps", 1e-5),
                    rope_theta: get_f32("rope_theta", 10000.0),
                    rotary_dim: None,
                    tie_word_embeddings: json
                        .get("tie_word_embeddings")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                }
            }
        };
        config.validate()?;
        Ok(config)
    }
}
