// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use skyscan_core::{ClusterAssignments, FeatureColumn, FeatureMatrix};
use skyscan_eval::{
    calinski_harabasz_score, clustering_metrics, davies_bouldin_score, silhouette_score,
};

const MIN_PROPTEST_CASES: u32 = 256;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

/// Two well-separated 2-d blobs with per-point jitter, plus labels.
fn two_blob_case(
    jitter: &[(f64, f64)],
    split: usize,
    separation: f64,
) -> (FeatureMatrix, ClusterAssignments) {
    let mut values = Vec::with_capacity(jitter.len() * 2);
    let mut labels = Vec::with_capacity(jitter.len());
    for (i, (dx, dy)) in jitter.iter().enumerate() {
        let offset = if i < split { 0.0 } else { separation };
        values.push(offset + dx);
        values.push(*dy);
        labels.push(if i < split { 0 } else { 1 });
    }
    let matrix = FeatureMatrix::new(
        values,
        jitter.len(),
        vec![FeatureColumn::Inclination, FeatureColumn::MeanMotion],
    )
    .expect("generated matrix must be valid");
    let assignments = ClusterAssignments::new(labels).expect("generated labels must be valid");
    (matrix, assignments)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        max_shrink_iters: 1024,
        failure_persistence: Some(Box::new(FileFailurePersistence::Direct("proptest-regressions/tests/proptest_invariants.txt"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn scores_stay_in_documented_ranges(
        jitter in prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 6..40),
        split_seed in 2usize..10,
        separation in 20.0f64..200.0,
    ) {
        let split = 2 + split_seed % (jitter.len() - 3);
        let (matrix, assignments) = two_blob_case(&jitter, split, separation);

        let silhouette = silhouette_score(&matrix, &assignments)
            .expect("silhouette should compute for two multi-member blobs");
        prop_assert!((-1.0..=1.0).contains(&silhouette));
        // Far-apart tight blobs must score strongly positive.
        prop_assert!(silhouette > 0.5);

        let db = davies_bouldin_score(&matrix, &assignments)
            .expect("davies-bouldin should compute");
        prop_assert!(db >= 0.0);

        let ch = calinski_harabasz_score(&matrix, &assignments)
            .expect("calinski-harabasz should compute");
        prop_assert!(ch >= 0.0);
    }

    #[test]
    fn evaluation_is_deterministic(
        jitter in prop::collection::vec((-2.0f64..2.0, -2.0f64..2.0), 6..32),
        separation in 10.0f64..100.0,
    ) {
        let split = jitter.len() / 2;
        let (matrix, assignments) = two_blob_case(&jitter, split, separation);
        let first = clustering_metrics(&matrix, &assignments)
            .expect("evaluation should succeed");
        let second = clustering_metrics(&matrix, &assignments)
            .expect("evaluation should succeed");
        prop_assert_eq!(first.metrics, second.metrics);
    }
}
