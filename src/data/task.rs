//! Task prompt templates
//!
//! A demonstration renders as `{input_prefix}{text}{label_prefix}{label_word}`
//! and the query as `{input_prefix}{text}{label_prefix}`. Demonstrations and
//! query are joined with [`TaskSpec::separator`]. Label words carry their
//! leading space so that each one starts a fresh word-initial token.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Prompt template and label words of a classification task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task name
    pub name: String,
    /// Text before each example's input
    pub input_prefix: String,
    /// Text between the input and the label word
    pub label_prefix: String,
    /// One verbalizer per class, in label-index order
    pub label_words: Vec<String>,
    /// Separator between consecutive demonstrations and the query
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "\n".to_string()
}

/// Names of the built-in tasks
pub const BUILTIN_TASKS: [&str; 4] = ["sst2", "agnews", "trec", "emo"];

impl TaskSpec {
    fn with(name: &str, input_prefix: &str, label_prefix: &str, words: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            input_prefix: input_prefix.to_string(),
            label_prefix: label_prefix.to_string(),
            label_words: words.iter().map(|w| (*w).to_string()).collect(),
            separator: default_separator(),
        }
    }

    /// Built-in task by name
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for an unknown name.
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            "sst2" => Ok(Self::with("sst2", "Review: ", "\nSentiment:", &[" Negative", " Positive"])),
            "agnews" => Ok(Self::with(
                "agnews",
                "Article: ",
                "\nAnswer:",
                &[" World", " Sports", " Business", " Technology"],
            )),
            "trec" => Ok(Self::with(
                "trec",
                "Question: ",
                "\nAnswer Type:",
                &[" Abbreviation", " Entity", " Description", " Person", " Location", " Number"],
            )),
            "emo" => Ok(Self::with("emo", "Dialogue: ", "\nEmotion:", &[" Others", " Happy", " Sad", " Angry"])),
            other => Err(Error::ConfigError(format!(
                "unknown task '{other}' (built-in tasks: {}); define a custom task in the spec",
                BUILTIN_TASKS.join(", ")
            ))),
        }
    }

    /// Number of classes
    pub fn num_labels(&self) -> usize {
        self.label_words.len()
    }

    /// Render one demonstration
    pub fn demonstration(&self, text: &str, label: usize) -> Result<String> {
        let word = self.label_word(label)?;
        Ok(format!("{}{text}{}{word}", self.input_prefix, self.label_prefix))
    }

    /// Render the query for an example
    pub fn query(&self, text: &str) -> String {
        format!("{}{text}{}", self.input_prefix, self.label_prefix)
    }

    /// Verbalizer of class `label`
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if `label` is not a class of this task.
    pub fn label_word(&self, label: usize) -> Result<&str> {
        self.label_words.get(label).map(String::as_str).ok_or_else(|| {
            Error::ConfigError(format!("label {label} out of range for task '{}' ({} classes)", self.name, self.num_labels()))
        })
    }

    /// Check the template is usable
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] with fewer than two classes or an empty label word.
    pub fn validate(&self) -> Result<()> {
        if self.num_labels() < 2 {
            return Err(Error::ConfigError(format!("task '{}' needs at least two label words", self.name)));
        }
        if let Some(i) = self.label_words.iter().position(|w| w.trim().is_empty()) {
            return Err(Error::ConfigError(format!("task '{}' has an empty label word at index {i}", self.name)));
        }
        Ok(())
    }
}
