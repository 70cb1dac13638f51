//! Adaptive threshold selection and F1

use super::curve::precision_recall_curve;
use super::{check_inputs, is_positive};
use crate::{Error, Result};

/// Keeps the F1 ratio finite where precision and recall are both zero
const F1_EPSILON: f64 = 1e-10;

/// Find the score threshold that maximises F1
///
/// Sweeps the precision-recall curve and returns `(threshold, f1)` for the
/// first point with maximal `2PR / (P + R)`. When several thresholds tie,
/// the lowest one wins.
///
/// # Errors
///
/// Fails on mismatched lengths, empty input, non-finite scores or when no
/// label is positive.
pub fn compute_threshold_and_f1_score(labels: &[f32], scores: &[f32]) -> Result<(f32, f32)> {
    let curve = precision_recall_curve(labels, scores)?;

    let mut best_idx = 0;
    let mut best_f1 = f64::NEG_INFINITY;
    for (idx, (p, r)) in curve.precision.iter().zip(curve.recall.iter()).enumerate() {
        let f1 = 2.0 * p * r / (p + r + F1_EPSILON);
        if f1 > best_f1 {
            best_f1 = f1;
            best_idx = idx;
        }
    }

    let threshold = curve
        .thresholds
        .get(best_idx)
        .copied()
        .ok_or_else(|| Error::UndefinedMetric {
            metric: "adaptive_threshold".to_string(),
            reason: "maximum F1 at the terminal curve point".to_string(),
        })?;

    Ok((threshold, best_f1 as f32))
}

/// F1 score of hard predictions against ground truth
///
/// Precision or recall with an empty denominator count as zero.
pub fn f1_score(labels: &[f32], predictions: &[bool]) -> Result<f64> {
    check_inputs("f1_score", labels, predictions.len())?;

    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    let mut false_negatives = 0usize;
    for (&label, &predicted) in labels.iter().zip(predictions.iter()) {
        match (is_positive(label), predicted) {
            (true, true) => true_positives += 1,
            (false, true) => false_positives += 1,
            (true, false) => false_negatives += 1,
            (false, false) => {}
        }
    }

    let predicted_positives = true_positives + false_positives;
    let actual_positives = true_positives + false_negatives;
    let precision = if predicted_positives == 0 {
        0.0
    } else {
        true_positives as f64 / predicted_positives as f64
    };
    let recall = if actual_positives == 0 {
        0.0
    } else {
        true_positives as f64 / actual_positives as f64
    };

    if precision + recall == 0.0 {
        return Ok(0.0);
    }
    Ok(2.0 * precision * recall / (precision + recall))
}
