//! Lifecycle tests for AnomalyModule

use super::*;
use crate::config::TaskType;
use crate::metrics::{compute_threshold_and_f1_score, names};
use crate::results::{AnomalyResults, Results};
use crate::{Error, Result};
use ndarray::{array, Array1, Array3, Array4, ArrayD, Axis};

/// Anomaly map = channel mean of the image
#[derive(Debug, Default)]
struct PixelModel {
    steps: usize,
}

impl AnomalyModel for PixelModel {
    type Output = ArrayD<f32>;

    fn forward(&mut self, images: &Array4<f32>) -> Result<ArrayD<f32>> {
        images
            .mean_axis(Axis(1))
            .map(|maps| maps.into_dyn())
            .ok_or_else(|| Error::ShapeMismatch {
                expected: vec![images.shape()[0], 1],
                got: images.shape().to_vec(),
            })
    }

    fn validation_step(&mut self, batch: &Batch, _batch_idx: usize) -> Result<StepOutput> {
        self.steps += 1;
        let maps = self.forward(&batch.images)?;
        Ok(StepOutput {
            image_paths: batch.image_paths.clone(),
            true_labels: batch.labels.clone(),
            true_masks: batch.masks.clone(),
            anomaly_maps: Some(maps),
            ..StepOutput::default()
        })
    }

    fn name(&self) -> &str {
        "PixelModel"
    }
}

/// Batch of 2x2 single-channel images whose pixels are the anomaly map
///
/// Masks are `[N, H, W]`, matching the maps `PixelModel` produces.
fn batch(maps: &[[f32; 4]], labels: &[f32]) -> Batch {
    let images = Array4::from_shape_fn((maps.len(), 1, 2, 2), |(n, _, i, j)| maps[n][i * 2 + j]);
    let masks = Array3::from_shape_fn((maps.len(), 2, 2), |(n, i, j)| {
        if maps[n][i * 2 + j] >= 0.5 {
            1.0
        } else {
            0.0
        }
    });
    Batch::new(images)
        .with_labels(Array1::from(labels.to_vec()))
        .with_masks(masks.into_dyn())
}

fn validation_outputs<M: AnomalyModel>(module: &mut AnomalyModule<M>, batches: &[Batch]) -> Vec<StepOutput> {
    batches
        .iter()
        .enumerate()
        .map(|(idx, b)| {
            let out = module.validation_step(b, idx).unwrap();
            module.validation_step_end(out).unwrap()
        })
        .collect()
}

fn epoch_batches() -> Vec<Batch> {
    vec![
        batch(&[[0.1, 0.2, 0.1, 0.3], [0.1, 0.9, 0.6, 0.2]], &[0.0, 1.0]),
        batch(&[[0.2, 0.4, 0.1, 0.1], [0.7, 0.1, 0.1, 0.1]], &[0.0, 1.0]),
    ]
}

#[test]
fn test_unknown_task_fails() {
    for task in ["detection", "", "CLASSIFICATION", "segment"] {
        let result = AnomalyModule::new(PixelModel::default(), task, true, 0.5);
        assert!(
            matches!(result, Err(Error::UnsupportedTask(ref t)) if t == task),
            "task {task:?} should be rejected"
        );
    }
}

#[test]
fn test_task_selects_results() {
    let module = AnomalyModule::new(PixelModel::default(), "classification", true, 0.5).unwrap();
    assert!(matches!(module.results(), Results::Classification(_)));
    assert_eq!(module.task(), TaskType::Classification);

    let module = AnomalyModule::new(PixelModel::default(), "segmentation", true, 0.5).unwrap();
    assert!(matches!(module.results(), Results::Segmentation(_)));
    assert_eq!(module.task(), TaskType::Segmentation);
}

#[test]
fn test_fixed_threshold_survives_validation_epoch() {
    let mut module =
        AnomalyModule::new(PixelModel::default(), "classification", false, 0.42).unwrap();

    let outputs = validation_outputs(&mut module, &epoch_batches());
    module.validation_epoch_end(&outputs).unwrap();

    assert_eq!(module.threshold(), 0.42);
    assert!(!module.adaptive_threshold());
}

#[test]
fn test_adaptive_threshold_replaced_by_helper() {
    let mut module =
        AnomalyModule::new(PixelModel::default(), "segmentation", true, 100.0).unwrap();

    let outputs = validation_outputs(&mut module, &epoch_batches());
    module.validation_epoch_end(&outputs).unwrap();

    let (expected, _) = compute_threshold_and_f1_score(
        module.results().true_labels(),
        module.results().pred_scores(),
    )
    .unwrap();
    assert_eq!(module.threshold(), expected);
    // Scores are [0.3, 0.9, 0.4, 0.7]; lowest anomalous score separates perfectly
    assert_eq!(module.threshold(), 0.7);
    assert_eq!(module.results().performance()[names::IMAGE_F1_SCORE], 1.0);
}

#[test]
fn test_test_epoch_keeps_threshold() {
    let mut module =
        AnomalyModule::new(PixelModel::default(), "classification", true, 0.35).unwrap();

    let outputs: Vec<StepOutput> = epoch_batches()
        .iter()
        .enumerate()
        .map(|(idx, b)| {
            let out = module.test_step(b, idx).unwrap();
            module.test_step_end(out).unwrap()
        })
        .collect();
    module.test_epoch_end(&outputs).unwrap();

    assert_eq!(module.threshold(), 0.35);
    // 0.4 is a false positive at 0.35
    assert_eq!(
        module.results().pred_labels(),
        &[false, true, true, true]
    );
}

#[test]
fn test_post_process_derives_scores_from_maps() {
    let module = AnomalyModule::new(PixelModel::default(), "segmentation", true, 0.5).unwrap();
    let output = StepOutput::new().with_anomaly_maps(
        array![[[0.1, 0.7], [0.3, 0.2]], [[0.05, 0.0], [0.01, 0.02]]].into_dyn(),
    );

    let processed = module.post_process(output, false).unwrap();

    assert_eq!(processed.pred_scores, Some(array![0.7, 0.05]));
    assert!(processed.pred_labels.is_none());
}

#[test]
fn test_post_process_keeps_model_scores() {
    let module = AnomalyModule::new(PixelModel::default(), "segmentation", true, 0.5).unwrap();
    let output = StepOutput::new()
        .with_pred_scores(array![0.25])
        .with_anomaly_maps(array![[[0.9]]].into_dyn());

    let processed = module.post_process(output, false).unwrap();
    assert_eq!(processed.pred_scores, Some(array![0.25]));
}

#[test]
fn test_predicted_labels_use_inclusive_threshold() {
    let module = AnomalyModule::new(PixelModel::default(), "classification", false, 0.5).unwrap();
    let output = StepOutput::new().with_pred_scores(array![0.49, 0.5, 0.51, -1.0]);

    let processed = module.post_process(output, true).unwrap();

    assert_eq!(
        processed.pred_labels,
        Some(array![false, true, true, false])
    );
}

#[test]
fn test_predict_step_labels_batch() {
    let mut module =
        AnomalyModule::new(PixelModel::default(), "segmentation", false, 0.5).unwrap();
    let b = batch(&[[0.1, 0.2, 0.3, 0.4], [0.0, 0.0, 0.5, 0.0]], &[0.0, 1.0]);

    let output = module.predict_step(&b, 0, 0).unwrap();

    assert_eq!(output.pred_scores, Some(array![0.4, 0.5]));
    assert_eq!(output.pred_labels, Some(array![false, true]));
    assert_eq!(module.model().steps, 1);
}

#[test]
fn test_predict_without_scores_or_maps_fails() {
    let module = AnomalyModule::new(PixelModel::default(), "classification", false, 0.5).unwrap();
    let err = module
        .post_process(StepOutput::new().with_true_labels(array![1.0]), true)
        .unwrap_err();
    assert!(matches!(err, Error::MissingOutput(_)));
}

#[test]
fn test_metrics_logged_per_epoch() {
    let logger = InMemoryLogger::new();
    let mut module = AnomalyModule::new(PixelModel::default(), "segmentation", false, 0.5)
        .unwrap()
        .with_logger(logger.clone());

    let outputs = validation_outputs(&mut module, &epoch_batches());
    module.validation_epoch_end(&outputs).unwrap();

    let records = logger.records();
    let logged: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        logged,
        vec![names::IMAGE_F1_SCORE, names::IMAGE_ROC_AUC, names::PIXEL_ROC_AUC]
    );
    assert!(records.iter().all(|r| r.options.on_epoch && r.options.prog_bar));
    assert_eq!(logger.latest(names::IMAGE_ROC_AUC), Some(1.0));
}

#[test]
fn test_state_round_trip() {
    let mut module =
        AnomalyModule::new(PixelModel::default(), "classification", true, 0.0).unwrap();
    let outputs = validation_outputs(&mut module, &epoch_batches());
    module.validation_epoch_end(&outputs).unwrap();
    let state = module.state();
    assert_eq!(state.model_name, "PixelModel");

    let mut restored =
        AnomalyModule::new(PixelModel::default(), "classification", true, 0.0).unwrap();
    restored.load_state(&state).unwrap();
    assert_eq!(restored.threshold(), module.threshold());
}

#[test]
fn test_load_state_rejects_other_task() {
    let seg = AnomalyModule::new(PixelModel::default(), "segmentation", true, 0.3).unwrap();
    let mut cls =
        AnomalyModule::new(PixelModel::default(), "classification", true, 0.0).unwrap();

    let err = cls.load_state(&seg.state()).unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
    assert_eq!(cls.threshold(), 0.0);
}

#[test]
fn test_forward_dispatches_to_model() {
    let mut module =
        AnomalyModule::new(PixelModel::default(), "segmentation", true, 0.5).unwrap();
    let images = Array4::from_elem((3, 2, 4, 4), 0.25f32);
    let maps = module.forward(&images).unwrap();
    assert_eq!(maps.shape(), &[3, 4, 4]);
}

#[test]
fn test_nan_map_leaves_adaptive_threshold_untouched() {
    let mut module =
        AnomalyModule::new(PixelModel::default(), "classification", true, 0.25).unwrap();
    let output = StepOutput::new()
        .with_true_labels(array![1.0, 0.0, 0.0])
        .with_anomaly_maps(array![[0.1, f32::NAN], [0.1, 0.2], [0.3, 0.1]].into_dyn());
    let output = module.validation_step_end(output).unwrap();
    assert!(output.pred_scores.as_ref().unwrap()[0].is_nan());

    let err = module.validation_epoch_end(&[output]).unwrap_err();

    assert!(matches!(err, Error::InvalidParameter(_)), "{err}");
    assert_eq!(module.threshold(), 0.25);
    let json = serde_json::to_string(&module.state()).unwrap();
    assert!(!json.contains("null"), "{json}");
}
