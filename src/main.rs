//! Anomalia CLI
//!
//! # Usage
//!
//! ```bash
//! # Validate config
//! anomalia validate config.yaml
//!
//! # Adaptive threshold for labelled scores
//! anomalia threshold scores.json
//!
//! # Replay an epoch end on dumped step outputs
//! anomalia evaluate config.yaml outputs.json --phase test --format json
//! ```

use anomalia::config::{
    apply_overrides, load_config, validate_config, Cli, Command, EvalPhase, EvaluateArgs,
    OutputFormat, ThresholdArgs, ValidateArgs,
};
use anomalia::io::load_state;
use anomalia::metrics::compute_threshold_and_f1_score;
use anomalia::module::{AnomalyModel, AnomalyModule, Batch, StepOutput};
use anomalia::results::{AnomalyResults, Performance};
use anomalia::Error;
use clap::Parser;
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Threshold(args) => run_threshold(args),
        Command::Evaluate(args) => run_evaluate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {e}");
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    tracing::info!(config = %args.config.display(), "validating config");

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    tracing::info!("configuration is valid");

    if args.detailed {
        println!("Configuration Summary:");
        println!("  Task: {}", spec.task);
        println!("  Adaptive threshold: {}", spec.threshold.adaptive);
        println!("  Default threshold: {}", spec.threshold.default);
        if let Some(es) = &spec.early_stopping {
            println!();
            println!("  Early stopping:");
            println!("    Metric: {}", es.metric);
            println!("    Patience: {}", es.patience);
            println!("    Min delta: {}", es.min_delta);
            println!("    Higher is better: {}", es.higher_is_better);
        }
    }

    Ok(())
}

/// Labelled scores read by the threshold command
#[derive(Debug, Deserialize)]
struct LabelledScores {
    labels: Vec<f32>,
    scores: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ThresholdReport {
    threshold: f32,
    f1_score: f32,
    samples: usize,
}

fn run_threshold(args: ThresholdArgs) -> Result<(), String> {
    let input: LabelledScores = read_json(&args.input)?;
    let (threshold, f1_score) = compute_threshold_and_f1_score(&input.labels, &input.scores)
        .map_err(|e| format!("Threshold error: {e}"))?;

    let report = ThresholdReport {
        threshold,
        f1_score,
        samples: input.scores.len(),
    };
    match args.format {
        OutputFormat::Text => {
            println!("Threshold: {}", report.threshold);
            println!("F1 score: {:.4}", report.f1_score);
            println!("Samples: {}", report.samples);
        }
        format => print_structured(&report, format)?,
    }
    Ok(())
}

/// Model stand-in for replaying dumped step outputs
///
/// Only the post-processing and epoch-end hooks run, so no step is ever
/// delegated to it.
struct Replay;

impl AnomalyModel for Replay {
    type Output = ();

    fn forward(&mut self, _images: &Array4<f32>) -> anomalia::Result<()> {
        Err(Error::InvalidParameter(
            "replayed outputs have no forward pass".to_string(),
        ))
    }

    fn validation_step(&mut self, _batch: &Batch, _batch_idx: usize) -> anomalia::Result<StepOutput> {
        Err(Error::InvalidParameter(
            "replayed outputs have no validation step".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "Replay"
    }
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    task: String,
    phase: String,
    threshold: f32,
    samples: usize,
    performance: Performance,
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), String> {
    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    let state = match &args.state {
        Some(path) => {
            let state = load_state(path).map_err(|e| format!("State error: {e}"))?;
            tracing::info!(path = %path.display(), threshold = state.threshold, "loaded module state");
            state.apply_to(&mut spec);
            Some(state)
        }
        None => None,
    };
    apply_overrides(&mut spec, &args);
    validate_config(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    let mut module = AnomalyModule::from_spec(Replay, spec);
    if let Some(state) = &state {
        module
            .load_state(state)
            .map_err(|e| format!("State error: {e}"))?;
    }

    let steps: Vec<StepOutput> = read_json(&args.outputs)?;
    tracing::debug!(steps = steps.len(), phase = ?args.phase, "replaying step outputs");

    let phase = match args.phase {
        EvalPhase::Validation => {
            let outputs = steps
                .into_iter()
                .map(|o| module.validation_step_end(o))
                .collect::<anomalia::Result<Vec<_>>>()
                .map_err(|e| format!("Evaluation error: {e}"))?;
            module
                .validation_epoch_end(&outputs)
                .map_err(|e| format!("Evaluation error: {e}"))?;
            "validation"
        }
        EvalPhase::Test => {
            let outputs = steps
                .into_iter()
                .map(|o| module.test_step_end(o))
                .collect::<anomalia::Result<Vec<_>>>()
                .map_err(|e| format!("Evaluation error: {e}"))?;
            module
                .test_epoch_end(&outputs)
                .map_err(|e| format!("Evaluation error: {e}"))?;
            "test"
        }
    };

    let report = EvaluationReport {
        task: module.task().to_string(),
        phase: phase.to_string(),
        threshold: module.threshold(),
        samples: module.results().pred_scores().len(),
        performance: module.results().performance().clone(),
    };

    match args.format {
        OutputFormat::Text => {
            println!("Task: {}", report.task);
            println!("Phase: {}", report.phase);
            println!("Threshold: {}", report.threshold);
            println!("Samples: {}", report.samples);
            for (name, value) in &report.performance {
                println!("  {name}: {value:.4}");
            }
        }
        format => print_structured(&report, format)?,
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<(), String> {
    let text = match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization error: {e}"))?
        }
        _ => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization error: {e}"))?,
    };
    println!("{text}");
    Ok(())
}
