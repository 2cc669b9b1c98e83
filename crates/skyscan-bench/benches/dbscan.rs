// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skyscan_cluster::{Dbscan, DbscanConfig};
use skyscan_core::{FeatureColumn, FeatureMatrix};

/// Four well-separated blobs with deterministic jitter.
fn blob_matrix(n: usize) -> FeatureMatrix {
    let centers = [
        [98.0, 0.001, 14.2],
        [55.0, 0.01, 2.2],
        [63.4, 0.7, 2.0],
        [0.05, 0.0001, 1.0],
    ];
    let mut values = Vec::with_capacity(n * 3);
    for i in 0..n {
        let center = centers[i % centers.len()];
        let jitter = ((i.wrapping_mul(2_654_435_761)) % 1_000) as f64 / 1_000.0 - 0.5;
        values.push(center[0] + jitter * 0.2);
        values.push(center[1]);
        values.push(center[2] + jitter * 0.02);
    }
    FeatureMatrix::new(values, n, FeatureColumn::default_columns())
        .expect("benchmark matrix should be valid")
}

fn bench_dbscan(c: &mut Criterion, case_suffix: &str, n: usize, min_points: usize) {
    let matrix = blob_matrix(n);
    let dbscan = Dbscan::new(DbscanConfig {
        eps: 0.6,
        min_points,
    })
    .expect("DBSCAN config should be valid");

    c.bench_function(&format!("dbscan_{case_suffix}"), |b| {
        b.iter(|| {
            dbscan
                .fit(black_box(&matrix))
                .expect("benchmark fit should succeed");
        })
    });
}

fn benchmark_dbscan_n1e3(c: &mut Criterion) {
    bench_dbscan(c, "n1e3_minpts10", 1_000, 10);
}

fn benchmark_dbscan_n5e3(c: &mut Criterion) {
    bench_dbscan(c, "n5e3_minpts50", 5_000, 50);
}

criterion_group!(benches, benchmark_dbscan_n1e3, benchmark_dbscan_n5e3);
criterion_main!(benches);
