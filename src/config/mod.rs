//! Declarative YAML configuration
//!
//! # Example
//!
//! ```yaml
//! task: segmentation
//!
//! threshold:
//!   adaptive: true
//!   default: 0.5
//!
//! early_stopping:
//!   metric: pixel_roc_auc
//!   patience: 3
//! ```

mod cli;
mod load;
mod schema;
mod validate;


pub use cli::{
    apply_overrides, parse_args, Cli, Command, EvalPhase, EvaluateArgs, OutputFormat,
    ThresholdArgs, ValidateArgs,
};
pub use load::{load_config, parse_config};
pub use schema::{EarlyStoppingSpec, ModuleSpec, TaskType, ThresholdSpec};
pub use validate::{validate_config, ValidationError};
