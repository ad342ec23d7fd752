//! Run command implementation

use super::validate::{format_sampling_info, format_training_info};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, check_paths, load_config, RunArgs};
use crate::experiment::run_from_spec;

pub fn run_run(args: RunArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Atencion: running {}", args.config.display()));

    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);
    spec.validate().map_err(|e| format!("Config error: {e}"))?;

    if args.dry_run {
        check_paths(&spec).map_err(|e| format!("Validation failed: {e}"))?;
        log(level, LogLevel::Normal, "Dry run - config validated successfully");
        log(level, LogLevel::Verbose, &format_sampling_info(&spec));
        log(level, LogLevel::Verbose, &format_training_info(&spec));
        return Ok(());
    }

    let outcome = run_from_spec(&spec).map_err(|e| format!("Run error: {e}"))?;
    log(level, LogLevel::Normal, &outcome.to_string());
    Ok(())
}
