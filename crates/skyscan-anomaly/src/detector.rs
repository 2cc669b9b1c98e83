// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::forest::{IsolationForest, IsolationForestConfig};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use skyscan_core::{
    AnomalyFlag, ClusterAssignments, FeatureMatrix, ScanError, StageDiagnostics,
};
use std::time::Instant;

const DEFAULT_MIN_CLUSTER_SIZE: usize = 10;

/// Configuration for [`ClusterAnomalyDetector`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnomalyConfig {
    /// Clusters below this size are not scored at all.
    pub min_cluster_size: usize,
    pub forest: IsolationForestConfig,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            forest: IsolationForestConfig::default(),
        }
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.min_cluster_size < 2 {
            return Err(ScanError::invalid_input(format!(
                "AnomalyConfig.min_cluster_size must be >= 2; got {}",
                self.min_cluster_size
            )));
        }
        self.forest.validate()
    }
}

/// Per-point anomaly verdicts for the whole population.
///
/// `flags` and `scores` are parallel to the input rows. Points in noise or in
/// a skipped cluster keep `Normal` and `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyOutcome {
    pub flags: Vec<AnomalyFlag>,
    pub scores: Vec<Option<f64>>,
    pub evaluated_clusters: Vec<i32>,
    pub diagnostics: StageDiagnostics,
}

impl AnomalyOutcome {
    pub fn flagged_count(&self) -> usize {
        self.flags.iter().filter(|f| f.is_anomaly()).count()
    }
}

/// Runs one isolation forest per sufficiently large cluster.
///
/// Every cluster's forest starts from the same seed, so membership alone
/// determines its scores. Noise points are never scored.
#[derive(Clone, Debug)]
pub struct ClusterAnomalyDetector {
    config: AnomalyConfig,
}

impl ClusterAnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Scores each eligible cluster on the raw (unscaled) feature rows.
    ///
    /// Normalization would reshape distances identically for every member of
    /// a cluster's forest, so the raw values carry more contrast.
    pub fn detect(
        &self,
        raw: &FeatureMatrix,
        assignments: &ClusterAssignments,
    ) -> Result<AnomalyOutcome, ScanError> {
        let started_at = Instant::now();
        if raw.n() != assignments.len() {
            return Err(ScanError::invalid_input(format!(
                "feature matrix has n={}; assignments have {}",
                raw.n(),
                assignments.len()
            )));
        }

        let clusters = assignments.members_by_cluster();
        let mut skipped_clusters = 0usize;
        let eligible: Vec<(i32, Vec<usize>)> = clusters
            .into_iter()
            .filter(|(_, members)| {
                if members.len() >= self.config.min_cluster_size {
                    true
                } else {
                    skipped_clusters += 1;
                    false
                }
            })
            .collect();

        let scored = self.score_clusters(raw, &eligible)?;

        let mut flags = vec![AnomalyFlag::Normal; raw.n()];
        let mut scores = vec![None; raw.n()];
        let mut evaluated_clusters = Vec::with_capacity(scored.len());
        for (cluster, members, cluster_scores) in scored {
            evaluated_clusters.push(cluster);
            for (slot, &row) in members.iter().enumerate() {
                flags[row] = cluster_scores.flags[slot];
                scores[row] = Some(cluster_scores.scores[slot]);
            }
        }

        let flagged = flags.iter().filter(|f| f.is_anomaly()).count();
        let mut diagnostics = StageDiagnostics::for_stage("detect_anomalies");
        diagnostics.n = raw.n();
        diagnostics.seed = Some(self.config.forest.seed);
        diagnostics.runtime_ms = elapsed_ms(started_at);
        diagnostics.notes.push(format!(
            "evaluated_clusters={}, flagged={}",
            evaluated_clusters.len(),
            flagged
        ));
        if skipped_clusters > 0 {
            diagnostics.notes.push(format!(
                "skipped_clusters={skipped_clusters} below min_cluster_size={}",
                self.config.min_cluster_size
            ));
        }
        if evaluated_clusters.is_empty() {
            diagnostics
                .warnings
                .push("no cluster met the minimum size; nothing was scored".to_string());
        }

        Ok(AnomalyOutcome {
            flags,
            scores,
            evaluated_clusters,
            diagnostics,
        })
    }

    #[cfg(feature = "rayon")]
    fn score_clusters(
        &self,
        raw: &FeatureMatrix,
        eligible: &[(i32, Vec<usize>)],
    ) -> Result<Vec<(i32, Vec<usize>, crate::forest::ForestScores)>, ScanError> {
        eligible
            .par_iter()
            .map(|(cluster, members)| self.score_one(raw, *cluster, members))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn score_clusters(
        &self,
        raw: &FeatureMatrix,
        eligible: &[(i32, Vec<usize>)],
    ) -> Result<Vec<(i32, Vec<usize>, crate::forest::ForestScores)>, ScanError> {
        eligible
            .iter()
            .map(|(cluster, members)| self.score_one(raw, *cluster, members))
            .collect()
    }

    fn score_one(
        &self,
        raw: &FeatureMatrix,
        cluster: i32,
        members: &[usize],
    ) -> Result<(i32, Vec<usize>, crate::forest::ForestScores), ScanError> {
        let mut values = Vec::with_capacity(members.len() * raw.d());
        for &row in members {
            values.extend_from_slice(raw.row(row));
        }
        let submatrix = FeatureMatrix::new(values, members.len(), raw.columns().to_vec())?;
        let forest = IsolationForest::new(self.config.forest)?;
        let scores = forest.score(&submatrix)?;
        Ok((cluster, members.to_vec(), scores))
    }
}

fn elapsed_ms(started_at: Instant) -> Option<u64> {
    u64::try_from(started_at.elapsed().as_millis()).ok()
}
