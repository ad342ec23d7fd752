//! Frozen decoder-only transformers built on the tape autograd engine
//!
//! ## Architecture Components
//!
//! - [`CausalLm`]: embeddings, decoder stack, final norm and LM head
//! - [`DecoderBlock`]: one layer with sequential or parallel residual
//! - [`CausalSelfAttention`]: causal attention with an adapter slot
//! - [`TransformerConfig`]: geometry of GPT-2, GPT-J and LLaMA checkpoints
//!
//! ## Example
//!
//! ```
//! use atencion::transformer::{AttentionContext, CausalLm, ModelFamily, TransformerConfig};
//! use atencion::Device;
//!
//! let config = TransformerConfig::tiny(ModelFamily::Llama, 64);
//! let model = CausalLm::new(&config, Device::Cpu)?;
//! let logits = model.forward(&[1, 2, 3], &AttentionContext::new(vec![], 3))?;
//! assert_eq!(logits.len(), 64);
//! # Ok::<(), atencion::Error>(())
//! ```

mod attention;
mod block;
mod config;
mod embedding;
mod family;
mod feedforward;
mod linear;
mod model;
mod norm;
mod weights;

pub use attention::{AttentionContext, CausalSelfAttention};
pub use block::DecoderBlock;
pub use config::TransformerConfig;
pub use embedding::Embedding;
pub use family::ModelFamily;
pub use feedforward::FeedForward;
pub use linear::Linear;
pub use model::CausalLm;
pub use norm::{LayerNorm, Norm, RMSNorm};
pub use weights::{load_safetensors_weights, WeightMap};

#[cfg(test)]
pub(crate) use weights::fixtures;
