//! Tokenizer trait definition.

use super::error::Result;

/// Token ID type
pub type TokenId = u32;

/// Byte span `[start, end)` of a token in the encoded text
pub type Offset = (usize, usize);

/// Tokenizer trait
pub trait Tokenizer: Send + Sync {
    /// Encode text to token IDs, without special tokens
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(self.encode_with_offsets(text)?.into_iter().map(|(id, _)| id).collect())
    }

    /// Encode text and report the byte span each token covers
    fn encode_with_offsets(&self, text: &str) -> Result<Vec<(TokenId, Offset)>>;

    /// Decode token IDs to text
    fn decode(&self, ids: &[TokenId]) -> Result<String>;

    /// Get vocabulary size
    fn vocab_size(&self) -> usize;

    /// Get token for ID
    fn id_to_token(&self, id: TokenId) -> Option<String>;

    /// Get ID for token
    fn token_to_id(&self, token: &str) -> Option<TokenId>;

    /// Token prepended to every prompt, if the model expects one
    fn bos_id(&self) -> Option<TokenId> {
        None
    }
}

/// Index of the first token that covers the first non-space byte at or after `start`
///
/// Returns `None` if `start` lies beyond the last token.
pub fn token_index_at(offsets: &[(TokenId, Offset)], text: &str, start: usize) -> Option<usize> {
    let target = text
        .get(start..)?
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(start, |(i, _)| start + i);
    offsets.iter().position(|&(_, (_, end))| end > target)
}
