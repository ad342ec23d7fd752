//! Info command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, InfoArgs, ModelSource, OutputFormat};

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Configuration Info:");
            println!();
            println!("Task: {}", spec.task_name);
            println!("Model: {}", spec.model_name);
            match &spec.model {
                ModelSource::Synthetic { .. } => println!("Weights: synthetic"),
                ModelSource::Pretrained { path } => println!("Weights: {}", path.display()),
            }
            println!("Seeds: {:?}", spec.seeds);
            println!("Epochs: {} (lr={}, batch size={})", spec.epoch_num, spec.lr, spec.batch_size);
            println!("Output: {}", spec.save_file_name.display());
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&spec).map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&spec).map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
