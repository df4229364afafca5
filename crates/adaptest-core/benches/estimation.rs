use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::calibration::ItemCalibrator;
use adaptest_core::estimation::AbilityEstimator;
use adaptest_core::model::{ItemParameters, ItemResponse, ScoredResponse};

fn make_responses(n: usize, theta: f64) -> Vec<ScoredResponse> {
    (0..n)
        .map(|i| {
            let b = -3.0 + 6.0 * i as f64 / n as f64;
            let parameters = ItemParameters::new(1.0 + (i % 5) as f64 * 0.3, b, 0.2).unwrap();
            ScoredResponse {
                parameters,
                correct: parameters.probability(theta) > 0.5,
            }
        })
        .collect()
}

fn make_item_responses(n: usize) -> Vec<ItemResponse> {
    (0..n)
        .map(|i| ItemResponse {
            respondent_theta: Some((i as f64 * 0.61).sin() * 2.0),
            correct: Some(i % 3 != 0),
        })
        .collect()
}

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");
    let estimator = AbilityEstimator::default();

    for n in [10, 50, 250] {
        let responses = make_responses(n, 0.4);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| estimator.estimate(black_box(&responses)))
        });
    }

    group.finish();
}

fn bench_calibrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibrate");
    let calibrator = ItemCalibrator::default();

    for n in [30, 300, 3000] {
        let responses = make_item_responses(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| calibrator.calibrate(black_box(&responses)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_estimate, bench_calibrate);
criterion_main!(benches);
