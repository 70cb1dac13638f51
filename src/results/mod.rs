//! Epoch-level aggregation of step outputs
//!
//! Results aggregators collect the post-processed outputs of one epoch,
//! expose the parallel label/score buffers the threshold helper needs, and
//! turn them into a performance-metric mapping for a given threshold.
//!
//! - [`ClassificationResults`]: `image_roc_auc`, `image_f1_score`
//! - [`SegmentationResults`]: the above plus `pixel_roc_auc`

mod classification;
mod segmentation;

pub use classification::ClassificationResults;
pub use segmentation::SegmentationResults;

use crate::config::TaskType;
use crate::module::StepOutput;
use crate::{Error, Result};
use ndarray::Array1;
use std::collections::BTreeMap;

/// Performance metrics by name
pub type Performance = BTreeMap<String, f64>;

/// Trait for results aggregators
pub trait AnomalyResults: Send {
    /// Replace the stored epoch data with the concatenation of `outputs`
    fn store_outputs(&mut self, outputs: &[StepOutput]) -> Result<()>;

    /// Compute predictions and performance metrics at `threshold`
    fn evaluate(&mut self, threshold: f32) -> Result<()>;

    /// Metrics from the last `evaluate`
    fn performance(&self) -> &Performance;

    /// Stored image-level ground truth
    fn true_labels(&self) -> &[f32];

    /// Stored image-level anomaly scores
    fn pred_scores(&self) -> &[f32];

    /// Image-level predictions from the last `evaluate`
    fn pred_labels(&self) -> &[bool];
}

/// Results aggregator selected by task type
#[derive(Debug, Clone)]
pub enum Results {
    Classification(ClassificationResults),
    Segmentation(SegmentationResults),
}

impl Results {
    /// Create the aggregator matching `task`
    pub fn for_task(task: TaskType) -> Self {
        match task {
            TaskType::Classification => Results::Classification(ClassificationResults::new()),
            TaskType::Segmentation => Results::Segmentation(SegmentationResults::new()),
        }
    }

    /// Task this aggregator evaluates
    pub fn task(&self) -> TaskType {
        match self {
            Results::Classification(_) => TaskType::Classification,
            Results::Segmentation(_) => TaskType::Segmentation,
        }
    }

    fn inner(&self) -> &dyn AnomalyResults {
        match self {
            Results::Classification(r) => r,
            Results::Segmentation(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn AnomalyResults {
        match self {
            Results::Classification(r) => r,
            Results::Segmentation(r) => r,
        }
    }
}

impl AnomalyResults for Results {
    fn store_outputs(&mut self, outputs: &[StepOutput]) -> Result<()> {
        self.inner_mut().store_outputs(outputs)
    }

    fn evaluate(&mut self, threshold: f32) -> Result<()> {
        self.inner_mut().evaluate(threshold)
    }

    fn performance(&self) -> &Performance {
        self.inner().performance()
    }

    fn true_labels(&self) -> &[f32] {
        self.inner().true_labels()
    }

    fn pred_scores(&self) -> &[f32] {
        self.inner().pred_scores()
    }

    fn pred_labels(&self) -> &[bool] {
        self.inner().pred_labels()
    }
}

/// Concatenate a required per-step 1-D field across steps
fn concat_field<F>(outputs: &[StepOutput], field: &str, get: F) -> Result<Vec<f32>>
where
    F: Fn(&StepOutput) -> Option<&Array1<f32>>,
{
    let mut values = Vec::new();
    for (step, output) in outputs.iter().enumerate() {
        let array = get(output).ok_or_else(|| {
            Error::MissingOutput(format!("{field} missing from step output {step}"))
        })?;
        values.extend(array.iter().copied());
    }
    Ok(values)
}

/// Insert a metric, skipping (with a warning) metrics undefined for the data
fn record_metric(performance: &mut Performance, name: &str, value: Result<f64>) -> Result<()> {
    match value {
        Ok(value) => {
            performance.insert(name.to_string(), value);
            Ok(())
        }
        Err(Error::UndefinedMetric { reason, .. }) => {
            tracing::warn!(metric = name, "skipping metric: {reason}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
