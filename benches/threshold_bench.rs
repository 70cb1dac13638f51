//! Performance benchmarks for epoch-end metric computation.
//!
//! Adaptive thresholding and ROC AUC run once per validation epoch over
//! every image score, and pixel ROC AUC over every map value.

use anomalia::metrics::{compute_threshold_and_f1_score, precision_recall_curve, roc_auc_score};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Deterministic labels and overlapping scores
fn samples(size: usize) -> (Vec<f32>, Vec<f32>) {
    let labels: Vec<f32> = (0..size).map(|i| if i % 7 == 0 { 1.0 } else { 0.0 }).collect();
    let scores: Vec<f32> = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            let noise = ((i as f32) * 0.618_034).fract();
            noise * 0.7 + label * 0.3
        })
        .collect();
    (labels, scores)
}

/// Benchmark adaptive threshold search
fn bench_adaptive_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("AdaptiveThreshold");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let (labels, scores) = samples(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), size, |b, _| {
            b.iter(|| black_box(compute_threshold_and_f1_score(&labels, &scores)))
        });
    }
    group.finish();
}

/// Benchmark the precision-recall curve alone
fn bench_pr_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("PrecisionRecallCurve");

    for size in [1_000, 100_000].iter() {
        let (labels, scores) = samples(*size);
        group.bench_with_input(BenchmarkId::new("curve", size), size, |b, _| {
            b.iter(|| black_box(precision_recall_curve(&labels, &scores)))
        });
    }
    group.finish();
}

/// Benchmark ROC AUC at pixel-level sizes (e.g. 32 images of 256x256)
fn bench_roc_auc(c: &mut Criterion) {
    let mut group = c.benchmark_group("RocAuc");

    for size in [10_000, 2_097_152].iter() {
        let (labels, scores) = samples(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("score", size), size, |b, _| {
            b.iter(|| black_box(roc_auc_score(&labels, &scores)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_adaptive_threshold,
    bench_pr_curve,
    bench_roc_auc
);
criterion_main!(benches);
