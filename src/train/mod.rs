//! Reweighting training driver
//!
//! For one seed the driver runs `epochs` passes over the encoded training
//! prompts. Every batch runs the frozen model with its adapters Active, takes
//! the cross-entropy of the label-token logits against the gold class, and
//! updates only the adapter parameters with Adam.

mod config;
mod loss;
mod trainer;


pub use config::TrainConfig;
pub use loss::{mean_loss, one_hot, CrossEntropyLoss, LossFn};
pub use trainer::{ReweightingTrainer, TrainResult};
