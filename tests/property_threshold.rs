use anomalia::metrics::{compute_threshold_and_f1_score, f1_score, roc_auc_score};
use anomalia::module::{max_per_sample, AnomalyModel, AnomalyModule, Batch, StepOutput};
use anomalia::results::AnomalyResults;
use anomalia::Result;
use ndarray::{Array1, Array4, ArrayD};
use proptest::collection::vec;
use proptest::prelude::*;

/// Replays fixed scores and labels regardless of the batch
struct Fixed {
    labels: Vec<f32>,
    scores: Vec<f32>,
}

impl AnomalyModel for Fixed {
    type Output = Array1<f32>;

    fn forward(&mut self, _images: &Array4<f32>) -> Result<Array1<f32>> {
        Ok(Array1::from(self.scores.clone()))
    }

    fn validation_step(&mut self, batch: &Batch, _batch_idx: usize) -> Result<StepOutput> {
        Ok(StepOutput::new()
            .with_pred_scores(self.forward(&batch.images)?)
            .with_true_labels(Array1::from(self.labels.clone())))
    }
}

/// Labels with at least one anomalous sample, paired with scores
fn labelled_scores() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (1usize..40).prop_flat_map(|n| {
        (
            vec(prop_oneof![Just(0.0f32), Just(1.0f32)], n),
            vec(-10.0f32..10.0, n),
        )
            .prop_map(|(mut labels, scores)| {
                labels[0] = 1.0;
                (labels, scores)
            })
    })
}

fn run_validation(labels: Vec<f32>, scores: Vec<f32>, adaptive: bool, default: f32) -> AnomalyModule<Fixed> {
    let mut module = AnomalyModule::new(Fixed { labels, scores }, "classification", adaptive, default)
        .expect("classification is supported");
    let batch = Batch::new(Array4::zeros((1, 1, 1, 1)));
    let output = module.validation_step(&batch, 0).unwrap();
    let output = module.validation_step_end(output).unwrap();
    module.validation_epoch_end(&[output]).unwrap();
    module
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =============================================================================
    // Threshold Lifecycle Properties
    // =============================================================================

    #[test]
    fn prop_adaptive_threshold_matches_helper((labels, scores) in labelled_scores()) {
        let (expected, _) = compute_threshold_and_f1_score(&labels, &scores).unwrap();
        let module = run_validation(labels, scores, true, 123.0);
        prop_assert_eq!(module.threshold(), expected);
    }

    #[test]
    fn prop_fixed_threshold_never_changes(
        (labels, scores) in labelled_scores(),
        default in -5.0f32..5.0,
    ) {
        let module = run_validation(labels, scores, false, default);
        prop_assert_eq!(module.threshold(), default);
    }

    #[test]
    fn prop_pred_labels_follow_threshold(
        (labels, scores) in labelled_scores(),
        default in -5.0f32..5.0,
    ) {
        let module = run_validation(labels, scores.clone(), false, default);
        let expected: Vec<bool> = scores.iter().map(|&s| s >= default).collect();
        prop_assert_eq!(module.results().pred_labels(), expected.as_slice());
    }

    #[test]
    fn prop_adaptive_f1_beats_any_observed_threshold((labels, scores) in labelled_scores()) {
        let module = run_validation(labels.clone(), scores.clone(), true, 0.0);
        let adaptive_preds: Vec<bool> = scores.iter().map(|&s| s >= module.threshold()).collect();
        let best = f1_score(&labels, &adaptive_preds).unwrap();

        for &t in &scores {
            let preds: Vec<bool> = scores.iter().map(|&s| s >= t).collect();
            prop_assert!(f1_score(&labels, &preds).unwrap() <= best + 1e-9);
        }
    }

    // =============================================================================
    // Score Derivation Properties
    // =============================================================================

    #[test]
    fn prop_scores_are_map_maxima(values in vec(-100.0f32..100.0, 1..64), n in 1usize..4) {
        let per_sample = values.len();
        let data: Vec<f32> = (0..n).flat_map(|k| values.iter().map(move |v| v + k as f32)).collect();
        let maps = ArrayD::from_shape_vec(vec![n, per_sample], data).unwrap();

        let scores = max_per_sample(&maps).unwrap();
        let base = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        for k in 0..n {
            prop_assert_eq!(scores[k], base + k as f32);
        }
    }

    #[test]
    fn prop_roc_auc_flips_with_scores((labels, scores) in labelled_scores()) {
        let has_normal = labels.iter().any(|&l| l < 0.5);
        prop_assume!(has_normal);
        let auc = roc_auc_score(&labels, &scores).unwrap();
        let negated: Vec<f32> = scores.iter().map(|s| -s).collect();
        let flipped = roc_auc_score(&labels, &negated).unwrap();
        prop_assert!((auc + flipped - 1.0).abs() < 1e-9);
    }
}
