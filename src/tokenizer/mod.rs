//! Tokenization
//!
//! Prompts are encoded without special tokens; a tokenizer that reports a
//! [`Tokenizer::bos_id`] gets it prepended by the prompt formatter. Every
//! tokenizer reports byte offsets so that label-word anchors can be located
//! inside a full prompt.
//!
//! # Example
//!
//! ```
//! use atencion::tokenizer::{Tokenizer, WordTokenizer};
//!
//! let tokenizer = WordTokenizer::from_corpus(&["Review: great\nSentiment: Positive"]);
//! let ids = tokenizer.encode("Sentiment: Positive")?;
//! assert_eq!(tokenizer.decode(&ids)?, "Sentiment: Positive");
//! # Ok::<(), atencion::tokenizer::TokenizerError>(())
//! ```

mod error;
mod hf;
mod traits;
mod word;

pub use error::{Result, TokenizerError};
pub use hf::HfTokenizer;
pub use traits::{token_index_at, Offset, TokenId, Tokenizer};
pub use word::{WordTokenizer, UNK_TOKEN};
