// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use skyscan_anomaly::{AnomalyConfig, ClusterAnomalyDetector, IsolationForest, IsolationForestConfig};
use skyscan_core::{ClusterAssignments, FeatureColumn, FeatureMatrix};

const MIN_PROPTEST_CASES: u32 = 64;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

fn matrix_1d(values: &[f64]) -> FeatureMatrix {
    FeatureMatrix::new(values.to_vec(), values.len(), vec![FeatureColumn::MeanMotion])
        .expect("generated matrix must be valid")
}

fn small_forest(seed: u64, contamination: f64) -> IsolationForest {
    IsolationForest::new(IsolationForestConfig {
        num_trees: 50,
        contamination,
        seed,
        max_samples: 256,
    })
    .expect("generated config must be valid")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        max_shrink_iters: 512,
        failure_persistence: Some(Box::new(FileFailurePersistence::Direct("proptest-regressions/tests/proptest_invariants.txt"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn forest_scores_are_finite_unit_interval_and_reproducible(
        values in prop::collection::vec(-100.0f64..100.0, 2..64),
        seed in 0u64..1000,
        contamination in 0.01f64..0.5,
    ) {
        let matrix = matrix_1d(&values);
        let forest = small_forest(seed, contamination);
        let first = forest.score(&matrix).expect("scoring should succeed");
        let second = forest.score(&matrix).expect("scoring should succeed");

        prop_assert_eq!(&first.scores, &second.scores);
        for &score in &first.scores {
            prop_assert!(score.is_finite());
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn flagged_fraction_never_exceeds_contamination_by_more_than_one_point(
        values in prop::collection::vec(-100.0f64..100.0, 4..64),
        seed in 0u64..1000,
        contamination in 0.01f64..0.5,
    ) {
        let matrix = matrix_1d(&values);
        let forest = small_forest(seed, contamination);
        let result = forest.score(&matrix).expect("scoring should succeed");

        // Strict-inequality flagging against an interpolated quantile caps
        // the flag count at the contamination share of the population,
        // rounded up by at most one.
        let ceiling = (contamination * values.len() as f64).ceil() as usize + 1;
        prop_assert!(result.flagged_count() <= ceiling);
    }

    #[test]
    fn detector_scores_exactly_the_members_of_large_enough_clusters(
        cluster_size in 2usize..30,
        min_cluster_size in 2usize..15,
        seed in 0u64..100,
    ) {
        let values: Vec<f64> = (0..cluster_size).map(|i| 10.0 + i as f64 * 0.1).collect();
        let matrix = matrix_1d(&values);
        let assignments =
            ClusterAssignments::new(vec![0; cluster_size]).expect("labels are valid");

        let detector = ClusterAnomalyDetector::new(AnomalyConfig {
            min_cluster_size,
            forest: IsolationForestConfig {
                num_trees: 20,
                seed,
                ..IsolationForestConfig::default()
            },
        })
        .expect("generated config must be valid");

        let outcome = detector
            .detect(&matrix, &assignments)
            .expect("detection should succeed");
        if cluster_size >= min_cluster_size {
            prop_assert!(outcome.scores.iter().all(Option::is_some));
        } else {
            prop_assert!(outcome.scores.iter().all(Option::is_none));
            prop_assert_eq!(outcome.flagged_count(), 0);
        }
    }
}
