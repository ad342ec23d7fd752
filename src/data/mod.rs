//! Task data: splits, providers, prompt templates and encoding
//!
//! # Example
//!
//! ```
//! use atencion::data::{LabeledExample, LabelIdMap, PromptFormatter, TaskSpec};
//! use atencion::tokenizer::WordTokenizer;
//!
//! let task = TaskSpec::builtin("sst2")?;
//! let demos = vec![LabeledExample::new("dull", 0), LabeledExample::new("great", 1)];
//! let tokenizer = WordTokenizer::from_corpus(&["Review: dull great fun\nSentiment: Negative Positive"]);
//! let formatter = PromptFormatter::new(&task, &tokenizer, &demos)?;
//! let prompt = formatter.encode(&LabeledExample::new("fun", 1))?;
//! assert_eq!(prompt.anchor_positions.len(), 2);
//! assert_eq!(LabelIdMap::new(&task, &tokenizer)?.len(), 2);
//! # Ok::<(), atencion::Error>(())
//! ```

mod dataset;
mod format;
mod provider;
mod task;


pub use dataset::{LabeledExample, TaskDataset, TaskSplits};
pub use format::{EncodedPrompt, LabelIdMap, PromptFormatter};
pub use provider::{DatasetProvider, InMemoryDatasetProvider, JsonlDatasetProvider};
pub use task::{TaskSpec, BUILTIN_TASKS};
