//! Anomaly module: phase hooks around a model

use super::logger::{LogOptions, MetricLogger, TracingLogger};
use super::output::max_per_sample;
use super::{AnomalyModel, Batch, StepOutput};
use crate::config::{ModuleSpec, TaskType, ThresholdSpec};
use crate::io::ModuleState;
use crate::metrics::compute_threshold_and_f1_score;
use crate::results::{AnomalyResults, Results};
use crate::{Error, Result};
use ndarray::Array4;

/// Wraps an [`AnomalyModel`] with the validation, test and predict hooks a
/// training loop calls
///
/// The module owns the decision threshold. It starts at the configured
/// default and, in adaptive mode, is replaced at the end of every
/// validation epoch by the F1-maximising threshold over that epoch's
/// scores. Test epochs evaluate with the current threshold and never
/// change it.
///
/// # Example
///
/// ```
/// use anomalia::module::{AnomalyModel, AnomalyModule, Batch, StepOutput};
/// use anomalia::Result;
/// use ndarray::{Array1, Array4, Axis};
///
/// struct MeanIntensity;
///
/// impl AnomalyModel for MeanIntensity {
///     type Output = Array1<f32>;
///
///     fn forward(&mut self, images: &Array4<f32>) -> Result<Array1<f32>> {
///         let n = images.shape()[0];
///         Ok(images.to_shape((n, images.len() / n.max(1))).unwrap().mean_axis(Axis(1)).unwrap())
///     }
///
///     fn validation_step(&mut self, batch: &Batch, _batch_idx: usize) -> Result<StepOutput> {
///         let mut output = StepOutput::new().with_pred_scores(self.forward(&batch.images)?);
///         output.true_labels = batch.labels.clone();
///         Ok(output)
///     }
/// }
///
/// let mut module = AnomalyModule::new(MeanIntensity, "classification", false, 0.5)?;
/// let batch = Batch::new(Array4::from_elem((2, 1, 4, 4), 0.8));
/// let output = module.predict_step(&batch, 0, 0)?;
/// assert_eq!(output.pred_labels.unwrap().to_vec(), vec![true, true]);
///
/// assert!(AnomalyModule::new(MeanIntensity, "detection", false, 0.5).is_err());
/// # Ok::<(), anomalia::Error>(())
/// ```
pub struct AnomalyModule<M: AnomalyModel> {
    model: M,
    hparams: ModuleSpec,
    adaptive_threshold: bool,
    threshold: f32,
    results: Results,
    logger: Box<dyn MetricLogger>,
}

impl<M: AnomalyModel> AnomalyModule<M> {
    /// Create a module for `task` ("classification" or "segmentation")
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedTask`] for any other task string.
    pub fn new(
        model: M,
        task: &str,
        adaptive_threshold: bool,
        default_threshold: f32,
    ) -> Result<Self> {
        let task: TaskType = task.parse()?;
        let spec = ModuleSpec {
            task,
            threshold: ThresholdSpec {
                adaptive: adaptive_threshold,
                default: default_threshold,
            },
            early_stopping: None,
        };
        Ok(Self::from_spec(model, spec))
    }

    /// Create a module from a parsed configuration
    pub fn from_spec(model: M, spec: ModuleSpec) -> Self {
        tracing::debug!(
            model = model.name(),
            task = %spec.task,
            adaptive = spec.threshold.adaptive,
            threshold = spec.threshold.default,
            "created anomaly module"
        );
        Self {
            model,
            adaptive_threshold: spec.threshold.adaptive,
            threshold: spec.threshold.default,
            results: Results::for_task(spec.task),
            hparams: spec,
            logger: Box::new(TracingLogger),
        }
    }

    /// Replace the metric logger
    pub fn with_logger<L: MetricLogger + 'static>(mut self, logger: L) -> Self {
        self.logger = Box::new(logger);
        self
    }

    /// Current decision threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Whether the threshold is recomputed every validation epoch
    pub fn adaptive_threshold(&self) -> bool {
        self.adaptive_threshold
    }

    pub fn task(&self) -> TaskType {
        self.results.task()
    }

    /// Results of the last completed epoch
    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Hyperparameters the module was built from
    pub fn hparams(&self) -> &ModuleSpec {
        &self.hparams
    }

    /// Snapshot of the persistent state (hyperparameters and threshold)
    pub fn state(&self) -> ModuleState {
        ModuleState {
            model_name: self.model.name().to_string(),
            hparams: self.hparams.clone(),
            threshold: self.threshold,
        }
    }

    /// Restore the threshold from a saved state
    ///
    /// # Errors
    ///
    /// Fails if the state was saved for a different task.
    pub fn load_state(&mut self, state: &ModuleState) -> Result<()> {
        if state.hparams.task != self.task() {
            return Err(Error::ConfigError(format!(
                "state was saved for task {}, module evaluates {}",
                state.hparams.task,
                self.task()
            )));
        }
        if !state.threshold.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "saved threshold {} is not finite",
                state.threshold
            )));
        }
        self.threshold = state.threshold;
        Ok(())
    }

    /// Forward-pass images through the model
    pub fn forward(&mut self, images: &Array4<f32>) -> Result<M::Output> {
        self.model.forward(images)
    }

    /// Compute anomaly maps and/or scores for a validation batch
    pub fn validation_step(&mut self, batch: &Batch, batch_idx: usize) -> Result<StepOutput> {
        self.model.validation_step(batch, batch_idx)
    }

    /// Same as [`validation_step`](Self::validation_step) for test batches
    pub fn test_step(&mut self, batch: &Batch, batch_idx: usize) -> Result<StepOutput> {
        self.validation_step(batch, batch_idx)
    }

    /// Step output with scores and predicted labels
    pub fn predict_step(
        &mut self,
        batch: &Batch,
        batch_idx: usize,
        _dataloader_idx: usize,
    ) -> Result<StepOutput> {
        let output = self.validation_step(batch, batch_idx)?;
        self.post_process(output, true)
    }

    /// Called at the end of each validation step
    pub fn validation_step_end(&self, output: StepOutput) -> Result<StepOutput> {
        self.post_process(output, false)
    }

    /// Called at the end of each test step
    pub fn test_step_end(&self, output: StepOutput) -> Result<StepOutput> {
        self.post_process(output, false)
    }

    /// Aggregate the epoch, update an adaptive threshold and log metrics
    pub fn validation_epoch_end(&mut self, outputs: &[StepOutput]) -> Result<()> {
        self.results.store_outputs(outputs)?;
        if self.adaptive_threshold {
            let (threshold, f1) = compute_threshold_and_f1_score(
                self.results.true_labels(),
                self.results.pred_scores(),
            )?;
            tracing::info!(
                previous = self.threshold,
                threshold,
                f1,
                "updated adaptive threshold"
            );
            self.threshold = threshold;
        }
        self.results.evaluate(self.threshold)?;
        self.log_metrics();
        Ok(())
    }

    /// Aggregate the epoch and log metrics at the current threshold
    pub fn test_epoch_end(&mut self, outputs: &[StepOutput]) -> Result<()> {
        self.results.store_outputs(outputs)?;
        self.results.evaluate(self.threshold)?;
        self.log_metrics();
        Ok(())
    }

    /// Derive scores (and optionally labels) a model did not produce
    ///
    /// Without `pred_scores`, a sample's score is the maximum over its
    /// anomaly map. With `predict_labels`, a sample is labelled anomalous
    /// when its score is `>=` the current threshold.
    pub fn post_process(&self, mut output: StepOutput, predict_labels: bool) -> Result<StepOutput> {
        if output.pred_scores.is_none() {
            if let Some(maps) = &output.anomaly_maps {
                output.pred_scores = Some(max_per_sample(maps)?);
            }
        }
        if predict_labels {
            let scores = output.pred_scores.as_ref().ok_or_else(|| {
                Error::MissingOutput(
                    "pred_scores (or anomaly_maps) required to predict labels".to_string(),
                )
            })?;
            let threshold = self.threshold;
            output.pred_labels = Some(scores.mapv(|s| s >= threshold));
        }
        Ok(output)
    }

    fn log_metrics(&mut self) {
        for (name, value) in self.results.performance() {
            self.logger.log(name, *value, LogOptions::epoch_progress());
        }
    }
}

impl<M: AnomalyModel + std::fmt::Debug> std::fmt::Debug for AnomalyModule<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyModule")
            .field("model", &self.model)
            .field("hparams", &self.hparams)
            .field("threshold", &self.threshold)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

