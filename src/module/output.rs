//! Per-step outputs produced by models and refined by post-processing

use crate::{Error, Result};
use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};

/// Output of a single validation, test or predict step
///
/// Models fill in what they compute; post-processing derives
/// `pred_scores` from `anomaly_maps` when a model only produces maps, and
/// `pred_labels` during prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Source path of each image
    #[serde(default)]
    pub image_paths: Vec<String>,
    /// Image-level ground truth, `[N]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_labels: Option<Array1<f32>>,
    /// Pixel-level ground truth, `[N, ...]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_masks: Option<ArrayD<f32>>,
    /// Image-level anomaly scores, `[N]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_scores: Option<Array1<f32>>,
    /// Image-level decisions at the module threshold, `[N]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_labels: Option<Array1<bool>>,
    /// Per-pixel anomaly scores, `[N, ...]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_maps: Option<ArrayD<f32>>,
}

impl StepOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_true_labels(mut self, labels: Array1<f32>) -> Self {
        self.true_labels = Some(labels);
        self
    }

    pub fn with_true_masks(mut self, masks: ArrayD<f32>) -> Self {
        self.true_masks = Some(masks);
        self
    }

    pub fn with_pred_scores(mut self, scores: Array1<f32>) -> Self {
        self.pred_scores = Some(scores);
        self
    }

    pub fn with_anomaly_maps(mut self, maps: ArrayD<f32>) -> Self {
        self.anomaly_maps = Some(maps);
        self
    }

    pub fn with_image_paths(mut self, paths: Vec<String>) -> Self {
        self.image_paths = paths;
        self
    }

    /// Number of samples, taken from the first field that is present
    pub fn len(&self) -> usize {
        if let Some(scores) = &self.pred_scores {
            return scores.len();
        }
        if let Some(maps) = &self.anomaly_maps {
            return maps.shape().first().copied().unwrap_or(0);
        }
        if let Some(labels) = &self.true_labels {
            return labels.len();
        }
        self.image_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-sample maximum over anomaly maps shaped `[N, ...]`
///
/// A NaN anywhere in a sample's map makes that sample's score NaN.
pub fn max_per_sample(maps: &ArrayD<f32>) -> Result<Array1<f32>> {
    if maps.ndim() < 2 {
        return Err(Error::ShapeMismatch {
            expected: vec![maps.shape().first().copied().unwrap_or(0), 1],
            got: maps.shape().to_vec(),
        });
    }

    maps.outer_iter()
        .map(|sample| {
            let mut values = sample.iter().copied();
            let first = values.next().ok_or_else(|| Error::ShapeMismatch {
                expected: vec![maps.shape()[0], 1],
                got: maps.shape().to_vec(),
            })?;
            Ok(values.fold(first, |acc, v| {
                if acc.is_nan() || v.is_nan() {
                    f32::NAN
                } else {
                    acc.max(v)
                }
            }))
        })
        .collect::<Result<Vec<f32>>>()
        .map(Array1::from)
}
