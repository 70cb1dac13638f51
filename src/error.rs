//! Error types for Anomalia

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported task: {0} (only classification and segmentation are supported)")]
    UnsupportedTask(String),

    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Missing output: {0}")]
    MissingOutput(String),

    #[error("Undefined metric {metric}: {reason}")]
    UndefinedMetric { metric: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
