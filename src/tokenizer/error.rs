//! Tokenizer error types.

use thiserror::Error;

/// Tokenizer errors
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// A word tokenizer was used before [`train`](super::WordTokenizer::train)
    #[error("Vocabulary not trained")]
    NotTrained,

    #[error("Invalid token ID: {0}")]
    InvalidTokenId(u32),

    /// `tokenizer.json` could not be read or parsed
    #[error("Failed to load tokenizer: {0}")]
    Load(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for tokenizer operations
pub type Result<T> = std::result::Result<T, TokenizerError>;
