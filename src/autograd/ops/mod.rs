//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod attention;
mod basic;
mod gather;
mod matmul;
mod normalize;
mod rotary;

// Re-export all public operations
pub use activations::{gelu, softmax, swish};
pub use attention::{attend, attention_weights, AttentionShape};
pub use basic::{add, add_bias, mul, scale, sum};
pub use gather::{gather, gather_rows};
pub use matmul::{matmul, matmul_compute, transpose};
pub use normalize::{layer_norm, rms_norm};
pub use rotary::{rotary_embedding, Rotary, RotaryStyle};
