//! Persisted result artifact

use super::record::RunRecord;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Provenance of an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub task_name: String,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
    /// Crate version that wrote the file
    pub version: String,
}

impl ArtifactMetadata {
    pub fn new(task_name: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            model_name: model_name.into(),
            created_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One record per seed, in seed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultArtifact {
    pub seeds: Vec<u64>,
    pub records: Vec<RunRecord>,
    pub metadata: ArtifactMetadata,
}

impl ResultArtifact {
    /// Pair seeds with their records
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the counts differ.
    pub fn new(seeds: Vec<u64>, records: Vec<RunRecord>, metadata: ArtifactMetadata) -> Result<Self> {
        if seeds.len() != records.len() {
            return Err(Error::shape("artifact records", seeds.len(), records.len()));
        }
        Ok(Self { seeds, records, metadata })
    }

    /// Mean active and bypassed accuracy over seeds
    pub fn mean_accuracy(&self) -> (f64, f64) {
        if self.records.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.records.len() as f64;
        let active: f64 = self.records.iter().map(|r| r.active_predictions.accuracy()).sum();
        let bypassed: f64 = self.records.iter().map(|r| r.bypassed_predictions.accuracy()).sum();
        (active / n, bypassed / n)
    }

    /// Write as JSON through a temp file in the target directory, then rename
    ///
    /// Parent directories are created. A reader never observes a partial file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] or [`Error::Serialization`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(path = %path.display(), records = self.records.len(), "saved result artifact");
        Ok(())
    }

    /// Read an artifact written by [`save`](Self::save)
    ///
    /// # Errors
    /// Returns [`Error::Io`] or [`Error::Serialization`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
