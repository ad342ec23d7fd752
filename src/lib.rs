//! # atencion
//!
//! Attention-adapter reweighting for in-context learning on frozen causal
//! language models.
//!
//! A run samples a demonstration set per seed, installs one trainable
//! [`adapter::AttentionAdapter`] into every attention layer of a frozen
//! [`transformer::CausalLm`], optimizes only those adapters against the task
//! loss, and evaluates the held-out sample twice: once with the adapters
//! active and once bypassed.
//!
//! ## Modules
//!
//! - `autograd`: tape-based reverse-mode differentiation
//! - `transformer`: GPT-2, GPT-J and LLaMA decoder stacks
//! - `adapter`: attention adapters and their manager
//! - `sampling`: stratified demonstration/training sampling
//! - `train`: reweighting training driver
//! - `eval`: active/bypassed ablation driver
//! - `experiment`: per-seed records and the persisted artifact
//!
//! ## Example
//!
//! ```no_run
//! use atencion::config::load_config;
//! use atencion::experiment::run_from_spec;
//!
//! let spec = load_config("sst2.yaml")?;
//! let outcome = run_from_spec(&spec)?;
//! println!("{outcome}");
//! # Ok::<(), atencion::Error>(())
//! ```

pub mod adapter;
pub mod autograd;
pub mod cli;
pub mod config;
pub mod data;
pub mod device;
pub mod error;
pub mod eval;
pub mod experiment;
pub mod optim;
pub mod provider;
pub mod sampling;
pub mod tokenizer;
pub mod train;
pub mod transformer;

pub use autograd::Tensor;
pub use device::Device;
pub use error::{Error, Result};
