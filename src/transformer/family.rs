//! Supported model families
//!
//! The set of architectures that can carry attention adapters is closed.
//! Model identifiers are resolved once, at configuration time; everything
//! downstream matches on [`ModelFamily`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoder-only architecture family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// GPT-2: learned positions, LayerNorm, sequential residual, GELU MLP
    Gpt2,
    /// GPT-J: interleaved rotary, LayerNorm, parallel residual, GELU MLP
    GptJ,
    /// LLaMA: half-split rotary, RMSNorm, sequential residual, SwiGLU MLP
    Llama,
}

impl ModelFamily {
    /// All supported families
    pub const ALL: [ModelFamily; 3] = [ModelFamily::Gpt2, ModelFamily::GptJ, ModelFamily::Llama];

    /// Resolve a model identifier
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedModel`] for identifiers outside the supported set.
    pub fn from_model_name(name: &str) -> Result<Self> {
        match name {
            "gpt2-xl" => Ok(ModelFamily::Gpt2),
            "gpt-j-6b" => Ok(ModelFamily::GptJ),
            "meta-llama/Llama-2-7b-chat-hf" => Ok(ModelFamily::Llama),
            other => Err(Error::UnsupportedModel { name: other.to_string() }),
        }
    }

    /// Canonical model identifier of the family
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelFamily::Gpt2 => "gpt2-xl",
            ModelFamily::GptJ => "gpt-j-6b",
            ModelFamily::Llama => "meta-llama/Llama-2-7b-chat-hf",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::Gpt2 => "gpt2",
            ModelFamily::GptJ => "gptj",
            ModelFamily::Llama => "llama",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_names_resolve() {
        assert_eq!(ModelFamily::from_model_name("gpt2-xl").unwrap(), ModelFamily::Gpt2);
        assert_eq!(ModelFamily::from_model_name("gpt-j-6b").unwrap(), ModelFamily::GptJ);
        assert_eq!(
            ModelFamily::from_model_name("meta-llama/Llama-2-7b-chat-hf").unwrap(),
            ModelFamily::Llama
        );
    }

    #[test]
    fn test_unsupported_name_is_rejected() {
        let err = ModelFamily::from_model_name("gpt2").unwrap_err();
        assert!(matches!(err, Error::UnsupportedModel { ref name } if name == "gpt2"));
    }

    #[test]
    fn test_model_name_round_trip() {
        for family in ModelFamily::ALL {
            assert_eq!(ModelFamily::from_model_name(family.model_name()).unwrap(), family);
        }
    }
}
