use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::model::{CalibratedItem, ItemParameters};
use adaptest_core::selection::{rank_candidates, select_next};

fn make_bank(n: usize) -> Vec<CalibratedItem> {
    (0..n)
        .map(|i| CalibratedItem {
            id: format!("item-{i:05}"),
            parameters: ItemParameters::new(
                0.5 + (i % 7) as f64 * 0.3,
                -3.0 + 6.0 * i as f64 / n as f64,
                0.2,
            )
            .unwrap(),
        })
        .collect()
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next");
    let exclude: HashSet<String> = (0..20).map(|i| format!("item-{i:05}")).collect();

    for n in [100, 1000, 10_000] {
        let bank = make_bank(n);
        group.bench_function(format!("bank={n}"), |b| {
            b.iter(|| select_next(black_box(0.3), black_box(&bank), &exclude))
        });
    }

    let bank = make_bank(1000);
    group.bench_function("rank bank=1000", |b| {
        b.iter(|| rank_candidates(black_box(0.3), black_box(&bank), &exclude))
    });

    group.finish();
}

criterion_group!(benches, bench_select);
criterion_main!(benches);
