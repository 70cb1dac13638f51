//! YAML schema definitions for anomaly module configuration

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of anomaly-detection task a module evaluates
///
/// Selects the results aggregator: image-level metrics only for
/// classification, image- and pixel-level metrics for segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskType {
    Classification,
    Segmentation,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Classification => "classification",
            TaskType::Segmentation => "segmentation",
        }
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classification" => Ok(TaskType::Classification),
            "segmentation" => Ok(TaskType::Segmentation),
            other => Err(Error::UnsupportedTask(other.to_string())),
        }
    }
}

impl TryFrom<String> for TaskType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskType> for String {
    fn from(task: TaskType) -> Self {
        task.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete module specification
///
/// This is also the hyperparameter record a module keeps and persists
/// with its state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Task type: "classification" | "segmentation"
    pub task: TaskType,

    /// Threshold configuration
    #[serde(default)]
    pub threshold: ThresholdSpec,

    /// Optional early stopping on a logged metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stopping: Option<EarlyStoppingSpec>,
}

impl ModuleSpec {
    /// Spec with the given task and default threshold settings
    pub fn new(task: TaskType) -> Self {
        Self {
            task,
            threshold: ThresholdSpec::default(),
            early_stopping: None,
        }
    }
}

/// Threshold configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Recompute the threshold at the end of every validation epoch
    #[serde(default = "default_true")]
    pub adaptive: bool,

    /// Threshold used until (or instead of) adaptive computation
    #[serde(default)]
    pub default: f32,
}

impl Default for ThresholdSpec {
    fn default() -> Self {
        Self {
            adaptive: true,
            default: 0.0,
        }
    }
}

/// Early stopping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingSpec {
    /// Name of the logged metric to monitor
    pub metric: String,

    /// Validation epochs without improvement before stopping
    #[serde(default = "default_patience")]
    pub patience: usize,

    /// Minimum change that counts as an improvement
    #[serde(default)]
    pub min_delta: f64,

    /// Whether higher metric values are better
    #[serde(default = "default_true")]
    pub higher_is_better: bool,
}

fn default_true() -> bool {
    true
}

fn default_patience() -> usize {
    3
}
