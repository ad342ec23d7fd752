//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{check_paths, load_config, ReweightingSpec, ValidateArgs};

/// Format the sampling settings of a spec
pub fn format_sampling_info(spec: &ReweightingSpec) -> String {
    let mut lines = vec![
        format!("  Seeds: {:?}", spec.seeds),
        format!("  Demonstrations per class: {}", spec.demonstration_shot),
        format!("  Training examples per class: {}", spec.train_num_per_class),
    ];
    if let Some(total) = spec.demonstration_total_shot {
        lines.push(format!("  Demonstration cap: {total}"));
    }
    lines.push(format!("  Evaluation sample: {} (from {})", spec.actual_sample_size, spec.sample_from));
    lines.join("\n")
}

/// Format the training settings of a spec
pub fn format_training_info(spec: &ReweightingSpec) -> String {
    let mut lines = vec![
        format!("  Learning rate: {}", spec.lr),
        format!("  Epochs: {}", spec.epoch_num),
        format!("  Batch size: {}", spec.batch_size),
    ];
    if let Some(n_head) = spec.n_head {
        lines.push(format!("  Adapter head groups: {n_head}"));
    }
    lines.join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating config: {}", args.config.display()));

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    if args.paths {
        check_paths(&spec).map_err(|e| format!("Validation failed: {e}"))?;
    }

    log(level, LogLevel::Normal, "Configuration is valid");
    log(level, LogLevel::Verbose, &format_sampling_info(&spec));
    log(level, LogLevel::Verbose, &format_training_info(&spec));
    Ok(())
}
