//! Word-level tokenizer trained on the task corpus.
//!
//! Text is split into pieces: a run of alphanumeric characters, or a single
//! other character, each optionally carrying one leading space (`" Positive"`
//! is one piece). Pieces never seen in training map to `<unk>`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{Result, TokenizerError};
use super::traits::{Offset, TokenId, Tokenizer};

/// Unknown-piece token
pub const UNK_TOKEN: &str = "<unk>";

/// Word-level tokenizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordTokenizer {
    vocab: HashMap<String, TokenId>,
    pieces: Vec<String>,
}

impl WordTokenizer {
    /// Create an untrained tokenizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the vocabulary from a corpus, in order of first appearance
    ///
    /// `<unk>` always receives ID 0.
    pub fn train(&mut self, corpus: &[&str]) {
        self.vocab.clear();
        self.pieces.clear();
        self.insert(UNK_TOKEN);
        for text in corpus {
            for (start, end) in split_pieces(text) {
                self.insert(&text[start..end]);
            }
        }
        tracing::debug!(vocab_size = self.pieces.len(), "trained word tokenizer");
    }

    /// Convenience constructor: new + train
    pub fn from_corpus(corpus: &[&str]) -> Self {
        let mut tokenizer = Self::new();
        tokenizer.train(corpus);
        tokenizer
    }

    /// Check if tokenizer is trained
    pub fn is_trained(&self) -> bool {
        !self.pieces.is_empty()
    }

    fn insert(&mut self, piece: &str) {
        if !self.vocab.contains_key(piece) {
            let id = self.pieces.len() as TokenId;
            self.vocab.insert(piece.to_string(), id);
            self.pieces.push(piece.to_string());
        }
    }
}

impl Tokenizer for WordTokenizer {
    fn encode_with_offsets(&self, text: &str) -> Result<Vec<(TokenId, Offset)>> {
        if !self.is_trained() {
            return Err(TokenizerError::NotTrained);
        }
        Ok(split_pieces(text)
            .into_iter()
            .map(|(start, end)| (self.vocab.get(&text[start..end]).copied().unwrap_or(0), (start, end)))
            .collect())
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        if !self.is_trained() {
            return Err(TokenizerError::NotTrained);
        }
        ids.iter()
            .map(|&id| self.pieces.get(id as usize).map(String::as_str).ok_or(TokenizerError::InvalidTokenId(id)))
            .collect()
    }

    fn vocab_size(&self) -> usize {
        self.pieces.len()
    }

    fn id_to_token(&self, id: TokenId) -> Option<String> {
        self.pieces.get(id as usize).cloned()
    }

    fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.vocab.get(token).copied()
    }
}

/// Byte spans of the pieces of `text`
fn split_pieces(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let mut head = c;
        if c == ' ' {
            match chars.peek() {
                Some(&(_, next)) if !next.is_whitespace() => {
                    head = next;
                    chars.next();
                }
                _ => {
                    spans.push((start, start + 1));
                    continue;
                }
            }
        }

        if head.is_alphanumeric() {
            while chars.peek().is_some_and(|&(_, n)| n.is_alphanumeric()) {
                chars.next();
            }
        }
        let end = chars.peek().map_or(text.len(), |&(i, _)| i);
        spans.push((start, end));
    }
    spans
}
