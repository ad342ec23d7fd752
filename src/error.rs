//! Error types with actionable diagnostics.
//!
//! Every fatal condition of a reweighting run surfaces as one [`Error`]
//! variant. Nothing here is retried: the runner propagates the first error and
//! aborts all remaining seeds.

use crate::config::ValidationError;
use crate::tokenizer::TokenizerError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for atencion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or executing a reweighting run.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic configuration problem (unreadable file, bad YAML, missing field).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The model name does not belong to a family that can carry adapters.
    #[error("Unsupported model '{name}'\n  → Supported models: gpt2-xl, gpt-j-6b, meta-llama/Llama-2-7b-chat-hf")]
    UnsupportedModel { name: String },

    /// Only the held-out test split can serve as the evaluation pool.
    #[error("Unsupported sample source '{source_name}'\n  → Set sample_from: test")]
    UnsupportedSampleSource { source_name: String },

    /// An adapter cannot be built for the given layer geometry.
    #[error("Cannot install attention adapter on layer {layer}: {reason}")]
    IncompatibleAdapter { layer: usize, reason: String },

    /// `params()` or `set_mode()` was called before `install()`.
    #[error("Attention adapters are not installed\n  → Call AdapterManager::install before collecting parameters")]
    AdaptersNotInstalled,

    /// Tensor or index shapes disagree during a forward pass.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch { context: String, expected: usize, actual: usize },

    /// Loss became NaN or infinite.
    #[error("Numeric instability at seed {seed}, epoch {epoch}, batch {batch}: loss = {loss}\n  → Try a smaller learning rate")]
    NumericInstability { seed: u64, epoch: usize, batch: usize, loss: f32 },

    /// Not enough examples to build the requested samples.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Failure while reading model weights.
    #[error("Failed to load weights from {path}: {message}")]
    WeightLoad { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Shorthand for [`Error::ShapeMismatch`].
    pub fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch { context: context.into(), expected, actual }
    }
}
