//! Evaluation and ablation
//!
//! After training, the evaluation sample is predicted twice on the same model
//! with the same demonstrations: first with the adapters Active, then with
//! every adapter Bypassed. The two [`PredictionSet`]s form the causal pair.

mod ablation;
mod confusion;
mod prediction;

#[cfg(test)]
mod tests;

pub use ablation::{AblationDriver, AblationResult};
pub use confusion::ConfusionMatrix;
pub use prediction::{Prediction, PredictionSet};
