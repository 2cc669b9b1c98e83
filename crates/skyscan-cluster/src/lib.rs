// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod dbscan;
pub mod regime;

pub use dbscan::{ClusterOutcome, Dbscan, DbscanConfig};
pub use regime::{
    classify_mean_motion, ClusterRegime, OrbitRegime, RegimeClassifier, RegimeLabeling,
    RegimeThresholds,
};

/// Clustering namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = skyscan_core::crate_name();
    "skyscan-cluster"
}
