// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod detector;
pub mod forest;

pub use detector::{AnomalyConfig, AnomalyOutcome, ClusterAnomalyDetector};
pub use forest::{ForestScores, IsolationForest, IsolationForestConfig};

/// Anomaly-detection namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = skyscan_core::crate_name();
    "skyscan-anomaly"
}
