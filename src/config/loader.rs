//! Spec file loading

use super::schema::ReweightingSpec;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Load and validate a spec from YAML
///
/// Data and model paths are not checked here; see
/// [`check_paths`](super::check_paths).
///
/// # Errors
/// Returns [`Error::ConfigError`] if the file cannot be read or parsed, and
/// any error of [`ReweightingSpec::validate`].
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<ReweightingSpec> {
    let config_path = config_path.as_ref();
    let yaml_content = fs::read_to_string(config_path).map_err(|e| {
        Error::ConfigError(format!("Failed to read config file {}: {e}", config_path.display()))
    })?;

    let spec: ReweightingSpec = serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))?;

    spec.validate()?;
    tracing::debug!(path = %config_path.display(), task = %spec.task_name, model = %spec.model_name, "loaded spec");
    Ok(spec)
}
