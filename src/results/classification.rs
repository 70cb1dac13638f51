//! Image-level results

use super::{concat_field, record_metric, AnomalyResults, Performance};
use crate::metrics::{f1_score, names, roc_auc_score};
use crate::module::StepOutput;
use crate::{Error, Result};

/// Image-level results of one epoch
#[derive(Debug, Clone, Default)]
pub struct ClassificationResults {
    image_paths: Vec<String>,
    true_labels: Vec<f32>,
    pred_scores: Vec<f32>,
    pred_labels: Vec<bool>,
    performance: Performance,
}

impl ClassificationResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image paths of the stored samples (empty if steps carried none)
    pub fn image_paths(&self) -> &[String] {
        &self.image_paths
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.pred_scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pred_scores.is_empty()
    }

    pub(super) fn set_performance(&mut self, performance: Performance) {
        self.performance = performance;
    }
}

impl AnomalyResults for ClassificationResults {
    fn store_outputs(&mut self, outputs: &[StepOutput]) -> Result<()> {
        let true_labels = concat_field(outputs, "true_labels", |o| o.true_labels.as_ref())?;
        let pred_scores = concat_field(outputs, "pred_scores", |o| o.pred_scores.as_ref())?;
        if true_labels.len() != pred_scores.len() {
            return Err(Error::ShapeMismatch {
                expected: vec![true_labels.len()],
                got: vec![pred_scores.len()],
            });
        }

        self.image_paths = outputs
            .iter()
            .flat_map(|o| o.image_paths.iter().cloned())
            .collect();
        self.true_labels = true_labels;
        self.pred_scores = pred_scores;
        self.pred_labels.clear();
        self.performance.clear();

        tracing::debug!(
            samples = self.pred_scores.len(),
            steps = outputs.len(),
            "stored image-level outputs"
        );
        Ok(())
    }

    fn evaluate(&mut self, threshold: f32) -> Result<()> {
        self.pred_labels = self.pred_scores.iter().map(|&s| s >= threshold).collect();
        self.performance.clear();

        record_metric(
            &mut self.performance,
            names::IMAGE_ROC_AUC,
            roc_auc_score(&self.true_labels, &self.pred_scores),
        )?;
        record_metric(
            &mut self.performance,
            names::IMAGE_F1_SCORE,
            f1_score(&self.true_labels, &self.pred_labels),
        )?;
        Ok(())
    }

    fn performance(&self) -> &Performance {
        &self.performance
    }

    fn true_labels(&self) -> &[f32] {
        &self.true_labels
    }

    fn pred_scores(&self) -> &[f32] {
        &self.pred_scores
    }

    fn pred_labels(&self) -> &[bool] {
        &self.pred_labels
    }
}
