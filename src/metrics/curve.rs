//! Score-sweeping curves: precision-recall and ROC AUC

use super::{check_finite, check_inputs, is_positive};
use crate::{Error, Result};

/// Precision-recall pairs over ascending score thresholds
///
/// `precision` and `recall` have one more entry than `thresholds`: the
/// final point is `(precision = 1, recall = 0)` and has no threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PrCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f32>,
}

impl PrCurve {
    /// Number of thresholded points (excludes the terminal point)
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

/// Indices of `scores` sorted by descending score
fn descending_order(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Compute the precision-recall curve of `scores` against `labels`
///
/// Every distinct score is a candidate threshold (a sample is predicted
/// anomalous when its score is `>=` the threshold). Thresholds below the
/// point where full recall is first reached are dropped, since lowering the
/// threshold further can only add false positives.
///
/// # Errors
///
/// Fails on mismatched lengths, empty input, non-finite scores or when no
/// sample is positive.
pub fn precision_recall_curve(labels: &[f32], scores: &[f32]) -> Result<PrCurve> {
    check_inputs("precision_recall_curve", labels, scores.len())?;
    check_finite("precision_recall_curve", scores)?;

    let total_positives = labels.iter().filter(|&&l| is_positive(l)).count();
    if total_positives == 0 {
        return Err(Error::UndefinedMetric {
            metric: "precision_recall_curve".to_string(),
            reason: "no positive samples".to_string(),
        });
    }

    let order = descending_order(scores);

    // (threshold, tp, fp) at each distinct score, highest score first
    let mut points: Vec<(f32, usize, usize)> = Vec::new();
    let mut tp = 0usize;
    let mut fp = 0usize;
    for (pos, &idx) in order.iter().enumerate() {
        if is_positive(labels[idx]) {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_group = order
            .get(pos + 1)
            .map(|&next| scores[next] != scores[idx])
            .unwrap_or(true);
        if last_of_group {
            points.push((scores[idx], tp, fp));
            if tp == total_positives {
                break;
            }
        }
    }

    points.reverse();

    let mut precision = Vec::with_capacity(points.len() + 1);
    let mut recall = Vec::with_capacity(points.len() + 1);
    let mut thresholds = Vec::with_capacity(points.len());
    for (threshold, tp, fp) in points {
        precision.push(tp as f64 / (tp + fp) as f64);
        recall.push(tp as f64 / total_positives as f64);
        thresholds.push(threshold);
    }
    precision.push(1.0);
    recall.push(0.0);

    Ok(PrCurve {
        precision,
        recall,
        thresholds,
    })
}

/// Area under the ROC curve
///
/// Computed as the normalised Mann-Whitney U statistic; tied scores
/// receive their average rank, which matches trapezoidal integration of
/// the ROC curve.
///
/// # Errors
///
/// Fails on mismatched lengths, empty input, non-finite scores or when
/// only one class is present.
pub fn roc_auc_score(labels: &[f32], scores: &[f32]) -> Result<f64> {
    check_inputs("roc_auc", labels, scores.len())?;
    check_finite("roc_auc", scores)?;

    let positives = labels.iter().filter(|&&l| is_positive(l)).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(Error::UndefinedMetric {
            metric: "roc_auc".to_string(),
            reason: "only one class present in labels".to_string(),
        });
    }

    // Ascending order; ranks are 1-based
    let mut order = descending_order(scores);
    order.reverse();

    let mut positive_rank_sum = 0.0f64;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let group_positives = order[start..end]
            .iter()
            .filter(|&&idx| is_positive(labels[idx]))
            .count();
        positive_rank_sum += average_rank * group_positives as f64;
        start = end;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Ok((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_pr_curve_truncates_at_full_recall() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        let scores = [0.1, 0.4, 0.35, 0.8];

        let curve = precision_recall_curve(&labels, &scores).unwrap();

        assert_eq!(curve.thresholds, vec![0.35, 0.4, 0.8]);
        assert_eq!(curve.precision.len(), 4);
        assert_abs_diff_eq!(curve.precision[0], 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.precision[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.precision[2], 1.0, epsilon = 1e-12);
        assert_eq!(curve.recall, vec![1.0, 0.5, 0.5, 0.0]);
        assert_eq!(*curve.precision.last().unwrap(), 1.0);
    }

    #[test]
    fn test_pr_curve_groups_tied_scores() {
        let labels = [1.0, 0.0, 1.0];
        let scores = [0.7, 0.7, 0.2];

        let curve = precision_recall_curve(&labels, &scores).unwrap();

        assert_eq!(curve.thresholds, vec![0.2, 0.7]);
        assert_abs_diff_eq!(curve.precision[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.recall[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_pr_curve_requires_positive() {
        let err = precision_recall_curve(&[0.0, 0.0], &[0.1, 0.2]).unwrap_err();
        assert!(matches!(err, Error::UndefinedMetric { .. }));
    }

    #[test]
    fn test_roc_auc_perfect_separation() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        let scores = [0.1, 0.2, 0.8, 0.9];
        assert_abs_diff_eq!(roc_auc_score(&labels, &scores).unwrap(), 1.0);
    }

    #[test]
    fn test_roc_auc_inverted() {
        let labels = [1.0, 1.0, 0.0, 0.0];
        let scores = [0.1, 0.2, 0.8, 0.9];
        assert_abs_diff_eq!(roc_auc_score(&labels, &scores).unwrap(), 0.0);
    }

    #[test]
    fn test_roc_auc_partial_overlap() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        let scores = [0.1, 0.4, 0.35, 0.8];
        assert_abs_diff_eq!(roc_auc_score(&labels, &scores).unwrap(), 0.75);
    }

    #[test]
    fn test_roc_auc_all_tied_is_half() {
        let labels = [0.0, 1.0, 0.0, 1.0];
        let scores = [0.5; 4];
        assert_abs_diff_eq!(roc_auc_score(&labels, &scores).unwrap(), 0.5);
    }

    #[test]
    fn test_nan_scores_rejected() {
        let labels = [1.0, 0.0, 0.0];
        let scores = [f32::NAN, 0.2, 0.3];
        let err = precision_recall_curve(&labels, &scores).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        let err = roc_auc_score(&labels, &scores).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_roc_auc_single_class() {
        let err = roc_auc_score(&[1.0, 1.0], &[0.2, 0.3]).unwrap_err();
        assert!(matches!(err, Error::UndefinedMetric { .. }));
    }
}
