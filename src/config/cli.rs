//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! anomalia validate config.yaml
//! anomalia threshold scores.json
//! anomalia evaluate config.yaml outputs.json --phase test --threshold 0.5
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Anomalia: anomaly-detection module evaluation
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "anomalia")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Post-process anomaly scores, compute adaptive thresholds and report metrics")]
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
    /// Validate a configuration file
    Validate(ValidateArgs),

    /// Compute the F1-maximising threshold for labelled scores
    Threshold(ThresholdArgs),

    /// Re-run epoch-end evaluation on dumped step outputs
    Evaluate(EvaluateArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show the parsed configuration
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the threshold command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ThresholdArgs {
    /// JSON file with `labels` and `scores` arrays
    #[arg(value_name = "SCORES")]
    pub input: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the evaluate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct EvaluateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// JSON file with a list of step outputs
    #[arg(value_name = "OUTPUTS")]
    pub outputs: PathBuf,

    /// Phase to evaluate as (validation recomputes an adaptive threshold)
    #[arg(short, long, default_value = "validation")]
    pub phase: EvalPhase,

    /// Override the default threshold
    #[arg(short, long, conflicts_with = "state")]
    pub threshold: Option<f32>,

    /// Disable adaptive threshold computation
    #[arg(long)]
    pub no_adaptive: bool,

    /// Load the threshold and adaptive setting from a saved module state
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for reports
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
            _ => Err(format!(
                "Unknown output format: {}. Valid formats: text, json, yaml",
                s
            )),
        }
    }
}

/// Phase whose epoch-end hook the evaluate command replays
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EvalPhase {
    #[default]
    Validation,
    Test,
}

impl std::str::FromStr for EvalPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "validation" | "val" => Ok(EvalPhase::Validation),
            "test" => Ok(EvalPhase::Test),
            _ => Err(format!(
                "Unknown phase: {}. Valid phases: validation, test",
                s
            )),
        }
    }
}

/// Parse command-line arguments
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a ModuleSpec
pub fn apply_overrides(spec: &mut super::ModuleSpec, args: &EvaluateArgs) {
    if let Some(threshold) = args.threshold {
        spec.threshold.default = threshold;
    }
    if args.no_adaptive {
        spec.threshold.adaptive = false;
    }
}
