//! Causal self-attention with an adapter slot
//!
//! The attention weights are materialized between the softmax and the value
//! aggregation. When an [`AttentionAdapter`] is installed in the slot it sees
//! those weights and may rescale them before `attend` consumes them.

use super::config::TransformerConfig;
use super::family::ModelFamily;
use super::linear::Linear;
use super::weights::WeightMap;
use crate::adapter::AttentionAdapter;
use crate::autograd::{attend, attention_weights, rotary_embedding, AttentionShape, Rotary};
use crate::error::Result;
use crate::Tensor;
use std::rc::Rc;

/// Per-prompt positions adapters need during a forward pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttentionContext {
    /// Position of the first label token of each demonstration, in order
    pub anchor_positions: Vec<usize>,
    /// Position whose next-token prediction is scored
    pub query_position: usize,
}

impl AttentionContext {
    /// Context for a prompt of `seq_len` tokens scored at its last position
    pub fn new(anchor_positions: Vec<usize>, seq_len: usize) -> Self {
        Self { anchor_positions, query_position: seq_len.saturating_sub(1) }
    }
}

/// Multi-head causal self-attention layer
pub struct CausalSelfAttention {
    layer: usize,
    /// Query projection (hidden_size x hidden_size)
    pub q_proj: Linear,
    /// Key projection (hidden_size x kv_hidden_size)
    pub k_proj: Linear,
    /// Value projection (hidden_size x kv_hidden_size)
    pub v_proj: Linear,
    /// Output projection (hidden_size x hidden_size)
    pub o_proj: Linear,
    num_heads: usize,
    num_kv_heads: usize,
    head_dim: usize,
    rotary: Option<Rotary>,
    adapter: Option<Rc<AttentionAdapter>>,
}

impl CausalSelfAttention {
    /// Create a frozen layer with deterministic weights
    pub fn new(config: &TransformerConfig, layer: usize) -> Self {
        let hidden = config.hidden_size;
        let kv_hidden = config.num_kv_heads * config.head_dim();
        let bias = config.family == ModelFamily::Gpt2;
        let salt = layer as f32;
        Self::assemble(
            config,
            layer,
            [
                Linear::new(hidden, hidden, bias, salt + 0.123),
                Linear::new(hidden, kv_hidden, bias, salt + 0.234),
                Linear::new(hidden, kv_hidden, bias, salt + 0.345),
                Linear::new(hidden, hidden, bias, salt + 0.456),
            ],
        )
    }

    /// Load `{prefix}.{q,k,v,o}_proj`
    pub fn from_weights(
        config: &TransformerConfig,
        weights: &mut WeightMap,
        prefix: &str,
        layer: usize,
    ) -> Result<Self> {
        let hidden = config.hidden_size;
        let kv_hidden = config.num_kv_heads * config.head_dim();
        let bias = config.family == ModelFamily::Gpt2;
        Ok(Self::assemble(
            config,
            layer,
            [
                weights.take_linear(&format!("{prefix}.q_proj"), hidden, hidden, bias)?,
                weights.take_linear(&format!("{prefix}.k_proj"), hidden, kv_hidden, bias)?,
                weights.take_linear(&format!("{prefix}.v_proj"), hidden, kv_hidden, bias)?,
                weights.take_linear(&format!("{prefix}.o_proj"), hidden, hidden, bias)?,
            ],
        ))
    }

    fn assemble(config: &TransformerConfig, layer: usize, projections: [Linear; 4]) -> Self {
        let [q_proj, k_proj, v_proj, o_proj] = projections;
        Self {
            layer,
            q_proj,
            k_proj,
            v_proj,
            o_proj,
            num_heads: config.num_attention_heads,
            num_kv_heads: config.num_kv_heads,
            head_dim: config.head_dim(),
            rotary: config.rotary(),
            adapter: None,
        }
    }

    /// Geometry of the attention weights for a sequence
    pub fn shape(&self, seq_len: usize) -> AttentionShape {
        AttentionShape {
            seq_len,
            num_heads: self.num_heads,
            num_kv_heads: self.num_kv_heads,
            head_dim: self.head_dim,
        }
    }

    /// Forward pass
    ///
    /// `x` is (seq_len x hidden_size), position-major.
    ///
    /// # Errors
    /// Propagates adapter shape errors.
    pub fn forward(&self, x: &Tensor, seq_len: usize, ctx: &AttentionContext) -> Result<Tensor> {
        let shape = self.shape(seq_len);

        let mut q = self.q_proj.forward(x, seq_len);
        let mut k = self.k_proj.forward(x, seq_len);
        let v = self.v_proj.forward(x, seq_len);

        if let Some(rotary) = self.rotary {
            q = rotary_embedding(&q, rotary, seq_len, self.num_heads, self.head_dim);
            k = rotary_embedding(&k, rotary, seq_len, self.num_kv_heads, self.head_dim);
        }

        let mut weights = attention_weights(&q, &k, shape);
        if let Some(adapter) = &self.adapter {
            weights = adapter.apply(&weights, shape, ctx)?;
        }

        let context = attend(&weights, &v, shape);
        Ok(self.o_proj.forward(&context, seq_len))
    }

    /// Index of this layer in the stack
    pub fn layer_index(&self) -> usize {
        self.layer
    }

    /// Number of query heads
    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    /// Adapter currently in the slot
    pub fn adapter(&self) -> Option<&Rc<AttentionAdapter>> {
        self.adapter.as_ref()
    }

    /// Fill (or replace) the adapter slot
    pub(crate) fn install_adapter(&mut self, adapter: Rc<AttentionAdapter>) {
        self.adapter = Some(adapter);
    }

    /// All frozen parameter tensors (excludes the adapter)
    pub fn parameters(&self) -> Vec<Tensor> {
        [&self.q_proj, &self.k_proj, &self.v_proj, &self.o_proj]
            .iter()
            .flat_map(|l| l.parameters())
            .collect()
    }
}
