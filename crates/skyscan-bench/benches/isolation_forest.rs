// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skyscan_anomaly::{IsolationForest, IsolationForestConfig};
use skyscan_core::{FeatureColumn, FeatureMatrix};

/// One dense family plus a sprinkling of displaced rows.
fn family_matrix(n: usize) -> FeatureMatrix {
    let mut values = Vec::with_capacity(n * 3);
    for i in 0..n {
        let jitter = ((i.wrapping_mul(2_654_435_761)) % 1_000) as f64 / 1_000.0 - 0.5;
        let displaced = i % 97 == 0;
        let shift = if displaced { 1.5 } else { 0.0 };
        values.push(98.0 + jitter * 0.5);
        values.push(0.001 + jitter.abs() * 0.0005);
        values.push(14.2 + jitter * 0.05 + shift);
    }
    FeatureMatrix::new(values, n, FeatureColumn::default_columns())
        .expect("benchmark matrix should be valid")
}

fn bench_forest(c: &mut Criterion, case_suffix: &str, n: usize, num_trees: usize) {
    let matrix = family_matrix(n);
    let forest = IsolationForest::new(IsolationForestConfig {
        num_trees,
        ..IsolationForestConfig::default()
    })
    .expect("forest config should be valid");

    c.bench_function(&format!("isolation_forest_{case_suffix}"), |b| {
        b.iter(|| {
            forest
                .score(black_box(&matrix))
                .expect("benchmark scoring should succeed");
        })
    });
}

fn benchmark_forest_n1e3_t100(c: &mut Criterion) {
    bench_forest(c, "n1e3_t100", 1_000, 100);
}

fn benchmark_forest_n1e4_t200(c: &mut Criterion) {
    bench_forest(c, "n1e4_t200", 10_000, 200);
}

criterion_group!(benches, benchmark_forest_n1e3_t100, benchmark_forest_n1e4_t200);
criterion_main!(benches);
