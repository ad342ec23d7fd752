//! Per-seed run record

use crate::adapter::AdapterWeights;
use crate::eval::PredictionSet;
use serde::{Deserialize, Serialize};

/// Everything one seed produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Evaluation pass with the trained adapters active
    pub active_predictions: PredictionSet,
    /// Average loss of every epoch
    pub loss_curve: Vec<f32>,
    /// Trained adapter weights, one entry per layer
    pub learned_params: Vec<AdapterWeights>,
    /// Evaluation pass with every adapter bypassed
    pub bypassed_predictions: PredictionSet,
    /// Average loss of the last epoch
    pub final_average_loss: f32,
}

impl RunRecord {
    /// Accuracy gained by the adapters on this seed
    pub fn accuracy_delta(&self) -> f64 {
        self.active_predictions.accuracy() - self.bypassed_predictions.accuracy()
    }
}
