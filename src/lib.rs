//! # Anomalia: anomaly-detection module lifecycle
//!
//! Anomalia wraps an anomaly-detection model with the hooks a training loop
//! calls during validation, test and prediction. It derives image scores
//! from anomaly maps, labels samples against a decision threshold, adapts
//! that threshold to the F1-optimal value after each validation epoch and
//! reports image- and pixel-level metrics.
//!
//! ## Architecture
//!
//! - **module**: `AnomalyModule` hooks, batches, step outputs, metric loggers
//! - **results**: Epoch aggregation for classification and segmentation
//! - **metrics**: PR curve, adaptive threshold, ROC AUC, F1
//! - **train**: Host-side runner with callbacks (progress, early stopping)
//! - **config**: Declarative YAML configuration and CLI
//! - **io**: Module state saving and loading (JSON, YAML formats)

pub mod config;
pub mod io;
pub mod metrics;
pub mod module;
pub mod results;
pub mod train;

pub mod error;

// Re-export commonly used types
pub use config::{ModuleSpec, TaskType};
pub use error::{Error, Result};
pub use module::{AnomalyModel, AnomalyModule, Batch, StepOutput};
