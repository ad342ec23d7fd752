//! Declarative YAML configuration
//!
//! A [`ReweightingSpec`] names the task, the model, the seeds and every shot
//! count of a run. [`load_config`] parses and validates it; [`check_paths`]
//! confirms the files it points at exist.
//!
//! ```yaml
//! task_name: sst2
//! model_name: gpt2-xl
//! seeds: [42, 43, 44]
//! demonstration_shot: 1
//! train_num_per_class: 4
//! actual_sample_size: 1000
//! lr: 0.01
//! epoch_num: 10
//! save_file_name: results/sst2_gpt2.json
//! data:
//!   train: data/sst2/train.jsonl
//!   test: data/sst2/test.jsonl
//! model:
//!   source: synthetic
//! ```

mod cli;
mod loader;
mod schema;
mod validate;

pub use cli::{apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, RunArgs, ValidateArgs};
pub use loader::load_config;
pub use schema::{DataPaths, ModelSource, ReweightingSpec, SAMPLE_FROM_TEST};
pub use validate::{check_paths, validate_config, ValidationError};
