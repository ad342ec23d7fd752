//! Experiment runner and result aggregation
//!
//! [`run_from_spec`] drives the whole protocol for every seed in order and
//! persists a [`ResultArtifact`] holding one [`RunRecord`] per seed.

mod artifact;
mod record;
mod runner;


pub use artifact::{ArtifactMetadata, ResultArtifact};
pub use record::RunRecord;
pub use runner::{run_from_spec, run_seeds, RunOutcome};
