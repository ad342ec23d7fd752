//! Validation error types

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Training data path does not exist: {0}")]
    TrainDataNotFound(String),

    #[error("Test data path does not exist: {0}")]
    TestDataNotFound(String),

    #[error("Model path does not exist: {0}")]
    ModelPathNotFound(String),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Seed list cannot be empty")]
    EmptySeeds,

    #[error("Invalid demonstration shot: {0} (must be > 0)")]
    InvalidDemonstrationShot(usize),

    #[error("Invalid demonstration total shot: {0} (must be > 0)")]
    InvalidDemonstrationTotalShot(usize),

    #[error("Invalid evaluation sample size: {0} (must be > 0)")]
    InvalidSampleSize(usize),

    #[error("Invalid head count: {0} (must be > 0)")]
    InvalidHeadCount(usize),

    #[error("save_file_name cannot be empty")]
    EmptySaveFileName,
}
