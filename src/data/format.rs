//! Prompt formatting and label-token mapping

use super::dataset::LabeledExample;
use super::task::TaskSpec;
use crate::error::{Error, Result};
use crate::tokenizer::{token_index_at, TokenId, Tokenizer};
use crate::transformer::AttentionContext;
use serde::{Deserialize, Serialize};

/// Model-ready prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPrompt {
    /// Token IDs, including a leading BOS if the tokenizer has one
    pub token_ids: Vec<TokenId>,
    /// Position of each demonstration's label word, in demonstration order
    pub anchor_positions: Vec<usize>,
    /// Final position; its logits give the prediction
    pub query_position: usize,
    /// Gold class index
    pub label: usize,
}

impl EncodedPrompt {
    /// Attention context passed to the model's forward pass
    pub fn context(&self) -> AttentionContext {
        AttentionContext { anchor_positions: self.anchor_positions.clone(), query_position: self.query_position }
    }
}

/// First token ID of each label word, in class order
///
/// Label tokens are looked up after the task's label prefix, the same context
/// they appear in inside prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelIdMap {
    ids: Vec<TokenId>,
}

impl LabelIdMap {
    /// Build the mapping for a task and tokenizer
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if two label words start with the same
    /// token, or if a label word encodes to nothing.
    pub fn new(task: &TaskSpec, tokenizer: &dyn Tokenizer) -> Result<Self> {
        let mut ids: Vec<TokenId> = Vec::with_capacity(task.num_labels());
        for (label, word) in task.label_words.iter().enumerate() {
            let text = format!("{}{word}", task.label_prefix);
            let offsets = tokenizer.encode_with_offsets(&text)?;
            let index = token_index_at(&offsets, &text, task.label_prefix.len())
                .ok_or_else(|| Error::ConfigError(format!("label word '{word}' encodes to no tokens")))?;
            let id = offsets[index].0;

            if let Some(other) = ids.iter().position(|&existing| existing == id) {
                return Err(Error::ConfigError(format!(
                    "label words '{}' and '{word}' share first token id {id}",
                    task.label_words[other]
                )));
            }
            tracing::debug!(label, word = word.as_str(), id, "label token");
            ids.push(id);
        }
        Ok(Self { ids })
    }

    /// Token IDs in class order
    pub fn ids(&self) -> &[TokenId] {
        &self.ids
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if the map has no classes
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Prepends a fixed demonstration set to queries and encodes them
pub struct PromptFormatter<'a> {
    task: &'a TaskSpec,
    tokenizer: &'a dyn Tokenizer,
    prefix: String,
    /// Byte offset of each demonstration's label word within `prefix`
    label_starts: Vec<usize>,
}

impl<'a> PromptFormatter<'a> {
    /// Render the demonstration prefix once
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if a demonstration's label is not a class of `task`.
    pub fn new(task: &'a TaskSpec, tokenizer: &'a dyn Tokenizer, demonstrations: &[LabeledExample]) -> Result<Self> {
        let mut prefix = String::new();
        let mut label_starts = Vec::with_capacity(demonstrations.len());
        for demo in demonstrations {
            let query = task.query(&demo.text);
            label_starts.push(prefix.len() + query.len());
            prefix.push_str(&task.demonstration(&demo.text, demo.label)?);
            prefix.push_str(&task.separator);
        }
        Ok(Self { task, tokenizer, prefix, label_starts })
    }

    /// Number of demonstrations in the prefix
    pub fn n_demo(&self) -> usize {
        self.label_starts.len()
    }

    /// Full prompt text for a query example
    pub fn render(&self, example: &LabeledExample) -> String {
        format!("{}{}", self.prefix, self.task.query(&example.text))
    }

    /// Encode one example behind the demonstrations
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for an out-of-range label and
    /// [`Error::ShapeMismatch`] if an anchor cannot be located before the query.
    pub fn encode(&self, example: &LabeledExample) -> Result<EncodedPrompt> {
        self.task.label_word(example.label)?;
        let text = self.render(example);
        let offsets = self.tokenizer.encode_with_offsets(&text)?;
        let shift = usize::from(self.tokenizer.bos_id().is_some());

        let mut token_ids = Vec::with_capacity(offsets.len() + shift);
        token_ids.extend(self.tokenizer.bos_id());
        token_ids.extend(offsets.iter().map(|&(id, _)| id));
        let query_position = token_ids.len().saturating_sub(1);

        let anchor_positions = self
            .label_starts
            .iter()
            .map(|&start| {
                token_index_at(&offsets, &text, start)
                    .map(|i| i + shift)
                    .filter(|&p| p < query_position)
                    .ok_or_else(|| Error::shape("demonstration anchor", query_position, start))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EncodedPrompt { token_ids, anchor_positions, query_position, label: example.label })
    }

    /// Encode every example
    ///
    /// # Errors
    /// Fails on the first example that [`encode`](Self::encode) rejects.
    pub fn encode_all(&self, examples: &[LabeledExample]) -> Result<Vec<EncodedPrompt>> {
        examples.iter().map(|e| self.encode(e)).collect()
    }
}
