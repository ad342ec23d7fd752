//! Model providers
//!
//! A provider turns a model family and a device into a frozen [`CausalLm`]
//! plus the tokenizer its vocabulary belongs to.

mod pretrained;
mod synthetic;

pub use pretrained::PretrainedModelProvider;
pub use synthetic::SyntheticModelProvider;

use crate::device::Device;
use crate::error::Result;
use crate::tokenizer::Tokenizer;
use crate::transformer::{CausalLm, ModelFamily, TransformerConfig};
use serde::{Deserialize, Serialize};

/// Frozen model and its tokenizer
pub struct LoadedModel {
    /// Base model, every parameter frozen
    pub model: CausalLm,
    /// Tokenizer matching the model's vocabulary
    pub tokenizer: Box<dyn Tokenizer>,
}

/// Source of a frozen model
pub trait ModelProvider {
    /// Build or load the model for `family` on `device`
    fn load(&self, family: ModelFamily, device: Device) -> Result<LoadedModel>;
}

/// Optional replacements for a base architecture's geometry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchitectureOverride {
    #[serde(default)]
    pub hidden_size: Option<usize>,
    #[serde(default)]
    pub num_attention_heads: Option<usize>,
    #[serde(default)]
    pub num_kv_heads: Option<usize>,
    #[serde(default)]
    pub intermediate_size: Option<usize>,
    #[serde(default)]
    pub num_hidden_layers: Option<usize>,
    #[serde(default)]
    pub max_position_embeddings: Option<usize>,
    #[serde(default)]
    pub rotary_dim: Option<usize>,
}

impl ArchitectureOverride {
    /// Apply every set field to `config`
    ///
    /// Without an explicit `num_kv_heads`, GPT-2 and GPT-J keep one KV head per
    /// attention head.
    pub fn apply(&self, mut config: TransformerConfig) -> TransformerConfig {
        if let Some(v) = self.hidden_size {
            config.hidden_size = v;
        }
        if let Some(v) = self.num_attention_heads {
            config.num_attention_heads = v;
            if config.family != ModelFamily::Llama {
                config.num_kv_heads = v;
            }
        }
        if let Some(v) = self.num_kv_heads {
            config.num_kv_heads = v;
        }
        if let Some(v) = self.intermediate_size {
            config.intermediate_size = v;
        }
        if let Some(v) = self.num_hidden_layers {
            config.num_hidden_layers = v;
        }
        if let Some(v) = self.max_position_embeddings {
            config.max_position_embeddings = v;
        }
        if self.rotary_dim.is_some() {
            config.rotary_dim = self.rotary_dim;
        }
        config
    }
}
