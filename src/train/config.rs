//! Training configuration

/// Hyperparameters of one reweighting run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Number of passes over the training sample
    pub epochs: usize,
    /// Prompts per optimizer step
    pub batch_size: usize,
    /// Adam learning rate
    pub lr: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { epochs: 10, batch_size: 1, lr: 0.01 }
    }
}

impl TrainConfig {
    /// Create default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of epochs
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set learning rate
    pub fn with_lr(mut self, lr: f32) -> Self {
        self.lr = lr;
        self
    }
}
