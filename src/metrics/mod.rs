//! Evaluation metrics for anomaly scores
//!
//! This module provides the helpers the anomaly module delegates to:
//! - Adaptive threshold: the score threshold that maximises F1
//! - Precision-recall curve over distinct score thresholds
//! - ROC AUC (Mann-Whitney with average ranks for ties)
//! - F1 score for hard predictions
//!
//! Ground-truth labels are binarised at `>= 0.5`, so both `{0, 1}` labels
//! and soft mask values can be passed directly.
//!
//! # Example
//!
//! ```
//! use anomalia::metrics::compute_threshold_and_f1_score;
//!
//! let labels = [0.0, 0.0, 1.0, 1.0];
//! let scores = [0.1, 0.4, 0.35, 0.8];
//!
//! let (threshold, f1) = compute_threshold_and_f1_score(&labels, &scores).unwrap();
//! assert_eq!(threshold, 0.35);
//! assert!(f1 > 0.79);
//! ```

mod curve;
mod threshold;

pub use curve::{precision_recall_curve, roc_auc_score, PrCurve};
pub use threshold::{compute_threshold_and_f1_score, f1_score};

use crate::{Error, Result};

/// Metric names reported by the results aggregators
pub mod names {
    /// Image-level ROC AUC
    pub const IMAGE_ROC_AUC: &str = "image_roc_auc";
    /// Image-level F1 at the current threshold
    pub const IMAGE_F1_SCORE: &str = "image_f1_score";
    /// Pixel-level ROC AUC (segmentation only)
    pub const PIXEL_ROC_AUC: &str = "pixel_roc_auc";
}

/// Binarise a ground-truth value
#[inline]
pub(crate) fn is_positive(label: f32) -> bool {
    label >= 0.5
}

/// Reject NaN and infinite scores, which have no place in a threshold sweep
fn check_finite(metric: &str, scores: &[f32]) -> Result<()> {
    match scores.iter().position(|s| !s.is_finite()) {
        Some(idx) => Err(Error::InvalidParameter(format!(
            "{metric}: score {} at index {idx} is not finite",
            scores[idx]
        ))),
        None => Ok(()),
    }
}

/// Check that labels and scores are parallel and non-empty
fn check_inputs(metric: &str, labels: &[f32], scores_len: usize) -> Result<()> {
    if labels.len() != scores_len {
        return Err(Error::ShapeMismatch {
            expected: vec![labels.len()],
            got: vec![scores_len],
        });
    }
    if labels.is_empty() {
        return Err(Error::UndefinedMetric {
            metric: metric.to_string(),
            reason: "no samples".to_string(),
        });
    }
    Ok(())
}
