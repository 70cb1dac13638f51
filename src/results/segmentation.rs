//! Image- and pixel-level results

use super::{record_metric, AnomalyResults, ClassificationResults, Performance};
use crate::metrics::{names, roc_auc_score};
use crate::module::StepOutput;
use crate::{Error, Result};
use ndarray::{concatenate, ArrayD, ArrayViewD, Axis};

/// Segmentation results of one epoch
///
/// Image-level data and metrics are delegated to a
/// [`ClassificationResults`]; anomaly maps and ground-truth masks are kept
/// alongside for the pixel-level metric.
#[derive(Debug, Clone, Default)]
pub struct SegmentationResults {
    images: ClassificationResults,
    anomaly_maps: Option<ArrayD<f32>>,
    true_masks: Option<ArrayD<f32>>,
}

impl SegmentationResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image-level part of the results
    pub fn image_results(&self) -> &ClassificationResults {
        &self.images
    }

    /// Stored anomaly maps, `[N, ...]`
    pub fn anomaly_maps(&self) -> Option<&ArrayD<f32>> {
        self.anomaly_maps.as_ref()
    }

    /// Stored ground-truth masks, `[N, ...]`
    pub fn true_masks(&self) -> Option<&ArrayD<f32>> {
        self.true_masks.as_ref()
    }
}

/// Concatenate a required per-step N-D field along the sample axis
fn concat_maps<F>(outputs: &[StepOutput], field: &str, get: F) -> Result<Option<ArrayD<f32>>>
where
    F: Fn(&StepOutput) -> Option<&ArrayD<f32>>,
{
    let mut views: Vec<ArrayViewD<'_, f32>> = Vec::with_capacity(outputs.len());
    for (step, output) in outputs.iter().enumerate() {
        let array = get(output).ok_or_else(|| {
            Error::MissingOutput(format!("{field} missing from step output {step}"))
        })?;
        if array.ndim() == 0 {
            return Err(Error::InvalidParameter(format!(
                "{field} in step output {step} has no sample axis"
            )));
        }
        if let Some(first) = views.first() {
            if first.shape()[1..] != array.shape()[1..] {
                return Err(Error::ShapeMismatch {
                    expected: first.shape().to_vec(),
                    got: array.shape().to_vec(),
                });
            }
        }
        views.push(array.view());
    }

    if views.is_empty() {
        return Ok(None);
    }
    concatenate(Axis(0), &views)
        .map(Some)
        .map_err(|e| Error::InvalidParameter(format!("cannot concatenate {field}: {e}")))
}

impl AnomalyResults for SegmentationResults {
    fn store_outputs(&mut self, outputs: &[StepOutput]) -> Result<()> {
        for output in outputs {
            if let (Some(maps), Some(masks)) = (&output.anomaly_maps, &output.true_masks) {
                if maps.shape() != masks.shape() {
                    return Err(Error::ShapeMismatch {
                        expected: masks.shape().to_vec(),
                        got: maps.shape().to_vec(),
                    });
                }
            }
            if let (Some(maps), Some(labels)) = (&output.anomaly_maps, &output.true_labels) {
                if maps.shape().first() != Some(&labels.len()) {
                    return Err(Error::ShapeMismatch {
                        expected: vec![labels.len()],
                        got: maps.shape().to_vec(),
                    });
                }
            }
        }

        let anomaly_maps = concat_maps(outputs, "anomaly_maps", |o| o.anomaly_maps.as_ref())?;
        let true_masks = concat_maps(outputs, "true_masks", |o| o.true_masks.as_ref())?;
        self.images.store_outputs(outputs)?;
        self.anomaly_maps = anomaly_maps;
        self.true_masks = true_masks;
        Ok(())
    }

    fn evaluate(&mut self, threshold: f32) -> Result<()> {
        self.images.evaluate(threshold)?;

        let mut performance = self.images.performance().clone();
        if let (Some(maps), Some(masks)) = (&self.anomaly_maps, &self.true_masks) {
            let pixel_scores: Vec<f32> = maps.iter().copied().collect();
            let pixel_labels: Vec<f32> = masks.iter().copied().collect();
            record_metric(
                &mut performance,
                names::PIXEL_ROC_AUC,
                roc_auc_score(&pixel_labels, &pixel_scores),
            )?;
        }
        self.images.set_performance(performance);
        Ok(())
    }

    fn performance(&self) -> &Performance {
        self.images.performance()
    }

    fn true_labels(&self) -> &[f32] {
        self.images.true_labels()
    }

    fn pred_scores(&self) -> &[f32] {
        self.images.pred_scores()
    }

    fn pred_labels(&self) -> &[bool] {
        self.images.pred_labels()
    }
}
