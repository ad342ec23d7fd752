//! CLI argument parsing
//!
//! ```bash
//! atencion run sst2.yaml
//! atencion run sst2.yaml --seeds 1,2,3 --epochs 5 --output results/quick.json
//! atencion validate sst2.yaml
//! atencion info sst2.yaml --format json
//! ```

use super::schema::ReweightingSpec;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Atencion: attention reweighting for in-context learning
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "atencion")]
#[command(version)]
#[command(about = "Train attention adapters on a frozen causal LM and ablate them on held-out data")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run every seed of a spec and write the result artifact
    Run(RunArgs),

    /// Validate a spec file without running it
    Validate(ValidateArgs),

    /// Display the resolved spec
    Info(InfoArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Path to YAML spec file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override the seed list (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub seeds: Option<Vec<u64>>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override the artifact path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Dry run (validate spec and paths but don't train)
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML spec file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Also check that data and model paths exist
    #[arg(short, long)]
    pub paths: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML spec file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for info command
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json, yaml")),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a spec
pub fn apply_overrides(spec: &mut ReweightingSpec, args: &RunArgs) {
    if let Some(seeds) = &args.seeds {
        spec.seeds = seeds.clone();
    }
    if let Some(lr) = args.lr {
        spec.lr = lr;
    }
    if let Some(epochs) = args.epochs {
        spec.epoch_num = epochs;
    }
    if let Some(output) = &args.output {
        spec.save_file_name = output.clone();
    }
}
