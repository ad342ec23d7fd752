//! HuggingFace `tokenizer.json` integration.

use std::path::Path;

use super::error::{Result, TokenizerError};
use super::traits::{Offset, TokenId, Tokenizer};

/// Pretrained tokenizer loaded from a HuggingFace `tokenizer.json`
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    bos_id: Option<TokenId>,
}

impl HfTokenizer {
    /// Load tokenizer from HuggingFace tokenizer.json file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TokenizerError::Load(format!("{}: {e}", path.display())))?;
        Ok(Self::from_inner(inner))
    }

    /// Load tokenizer from JSON string
    ///
    /// # Errors
    /// Returns error if JSON parsing fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let inner: tokenizers::Tokenizer = json
            .parse()
            .map_err(|e| TokenizerError::Serialization(format!("Failed to parse tokenizer JSON: {e}")))?;
        Ok(Self::from_inner(inner))
    }

    fn from_inner(inner: tokenizers::Tokenizer) -> Self {
        // SentencePiece models (LLaMA) start every sequence with <s>; GPT-2 BPE does not
        let bos_id = inner.token_to_id("<s>");
        Self { inner, bos_id }
    }
}

impl Tokenizer for HfTokenizer {
    fn encode_with_offsets(&self, text: &str) -> Result<Vec<(TokenId, Offset)>> {
        let encoding = self.inner.encode(text, false).map_err(|e| TokenizerError::Encoding(e.to_string()))?;
        Ok(encoding.get_ids().iter().copied().zip(encoding.get_offsets().iter().copied()).collect())
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        self.inner.decode(ids, false).map_err(|e| TokenizerError::Encoding(e.to_string()))
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn id_to_token(&self, id: TokenId) -> Option<String> {
        self.inner.id_to_token(id)
    }

    fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.inner.token_to_id(token)
    }

    fn bos_id(&self) -> Option<TokenId> {
        self.bos_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDLEVEL_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "<unk>": 0, "<s>": 1, "good": 2, "movie": 3, ":": 4 },
            "unk_token": "<unk>"
        }
    }"#;

    #[test]
    fn test_hf_tokenizer_from_json() {
        let tokenizer = HfTokenizer::from_json(WORDLEVEL_JSON).unwrap();
        assert_eq!(tokenizer.vocab_size(), 5);
        assert_eq!(tokenizer.bos_id(), Some(1));
        assert_eq!(tokenizer.encode("good movie").unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_hf_tokenizer_offsets() {
        let tokenizer = HfTokenizer::from_json(WORDLEVEL_JSON).unwrap();
        let encoded = tokenizer.encode_with_offsets("good: movie").unwrap();
        assert_eq!(encoded, vec![(2, (0, 4)), (4, (4, 5)), (3, (6, 11))]);
    }

    #[test]
    fn test_hf_tokenizer_from_json_invalid() {
        assert!(matches!(HfTokenizer::from_json("not json"), Err(TokenizerError::Serialization(_))));
    }

    #[test]
    fn test_hf_tokenizer_missing_file() {
        assert!(matches!(HfTokenizer::from_file("/nonexistent/tokenizer.json"), Err(TokenizerError::Load(_))));
    }
}
