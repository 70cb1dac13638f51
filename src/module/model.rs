//! The algorithm-specific half of an anomaly module

use super::{Batch, StepOutput};
use crate::Result;
use ndarray::Array4;

/// Trait for anomaly-detection models wrapped by [`AnomalyModule`]
///
/// A model turns images into its own raw output (`forward`) and into the
/// per-step output consumed by the evaluation hooks (`validation_step`).
/// Everything that is common across models (score derivation, thresholds,
/// metrics) lives in the module.
///
/// # Example
///
/// ```
/// use anomalia::module::{AnomalyModel, Batch, StepOutput};
/// use anomalia::Result;
/// use ndarray::{Array4, ArrayD, Axis};
///
/// /// Scores each pixel by its mean intensity across channels
/// struct Brightness;
///
/// impl AnomalyModel for Brightness {
///     type Output = ArrayD<f32>;
///
///     fn forward(&mut self, images: &Array4<f32>) -> Result<ArrayD<f32>> {
///         Ok(images.mean_axis(Axis(1)).unwrap().into_dyn())
///     }
///
///     fn validation_step(&mut self, batch: &Batch, _batch_idx: usize) -> Result<StepOutput> {
///         let maps = self.forward(&batch.images)?;
///         let mut output = StepOutput::new().with_anomaly_maps(maps);
///         output.true_labels = batch.labels.clone();
///         Ok(output)
///     }
/// }
/// ```
///
/// [`AnomalyModule`]: super::AnomalyModule
pub trait AnomalyModel: Send {
    /// Raw output of the forward pass
    type Output;

    /// Forward pass over a batch of images, `[N, C, H, W]`
    fn forward(&mut self, images: &Array4<f32>) -> Result<Self::Output>;

    /// Compute anomaly maps and/or scores for a batch
    ///
    /// Ground truth from the batch should be carried over into the output
    /// so that epoch-end evaluation can use it.
    fn validation_step(&mut self, batch: &Batch, batch_idx: usize) -> Result<StepOutput>;

    /// Model name for logging and persisted state
    fn name(&self) -> &str {
        "AnomalyModel"
    }
}
