// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::ScanError;
use std::collections::BTreeMap;

/// Cluster id reserved for points not density-reachable from any core point.
pub const NOISE_CLUSTER: i32 = -1;

/// Per-object anomaly verdict; objects default to `Normal` and only a
/// cluster-local model may promote them to `Anomaly`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnomalyFlag {
    #[default]
    Normal,
    Anomaly,
}

impl AnomalyFlag {
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Self::Anomaly)
    }
}

/// Immutable result of the cluster engine: one label per input row.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterAssignments {
    labels: Vec<i32>,
    cluster_count: usize,
}

impl ClusterAssignments {
    pub fn new(labels: Vec<i32>) -> Result<Self, ScanError> {
        let mut max_label = NOISE_CLUSTER;
        for (i, label) in labels.iter().enumerate() {
            if *label < NOISE_CLUSTER {
                return Err(ScanError::invalid_input(format!(
                    "cluster label at row {i} must be >= -1; got {label}"
                )));
            }
            max_label = max_label.max(*label);
        }
        let cluster_count = usize::try_from(max_label + 1)
            .map_err(|_| ScanError::resource_limit("cluster count conversion overflow"))?;
        Ok(Self {
            labels,
            cluster_count,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn label(&self, i: usize) -> i32 {
        self.labels[i]
    }

    pub fn is_noise(&self, i: usize) -> bool {
        self.labels[i] == NOISE_CLUSTER
    }

    /// Number of distinct non-noise clusters.
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn noise_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|label| **label == NOISE_CLUSTER)
            .count()
    }

    /// Row indices per non-noise cluster, keyed by ascending cluster id.
    pub fn members_by_cluster(&self) -> BTreeMap<i32, Vec<usize>> {
        let mut members: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, label) in self.labels.iter().enumerate() {
            if *label != NOISE_CLUSTER {
                members.entry(*label).or_default().push(i);
            }
        }
        members
    }

    /// Row counts per cluster id, noise included.
    pub fn counts_by_label(&self) -> BTreeMap<i32, usize> {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(*label).or_default() += 1;
        }
        counts
    }
}
