//! Attention adapters
//!
//! Adapters rescale the attention a frozen model pays from the query position
//! to demonstration label tokens. An [`AdapterManager`] installs one
//! [`AttentionAdapter`] into the adapter slot of every attention layer, exposes
//! their parameters to the optimizer and switches all of them between
//! [`AdapterMode::Active`] and [`AdapterMode::Bypassed`].

mod attention_adapter;
mod manager;
mod mode;


pub use attention_adapter::AttentionAdapter;
pub use manager::{AdapterManager, AdapterWeights};
pub use mode::{AdapterMode, ModeHandle};
