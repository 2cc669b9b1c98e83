// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_core::{ClusterAssignments, FeatureMatrix, ScanError, StageDiagnostics};
use std::collections::BTreeMap;
use std::time::Instant;

/// Internal-quality summary for one clustering run.
///
/// All three scores exclude noise points; they describe only the points that
/// landed in a real cluster.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusteringMetrics {
    pub silhouette: f64,
    pub davies_bouldin: f64,
    pub calinski_harabasz: f64,
    pub evaluated_points: usize,
    pub evaluated_clusters: usize,
}

/// Metrics plus the evaluation stage record.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationOutcome {
    pub metrics: Option<ClusteringMetrics>,
    pub diagnostics: StageDiagnostics,
}

/// Computes all three quality scores, or `None` when they are undefined.
///
/// Definedness requires at least two non-noise points spread over at least
/// two clusters, with at least one cluster holding more than one point (the
/// all-singletons case leaves the silhouette undefined). An undefined run is
/// not an error; it is recorded in the diagnostics and the caller moves on.
pub fn clustering_metrics(
    matrix: &FeatureMatrix,
    assignments: &ClusterAssignments,
) -> Result<EvaluationOutcome, ScanError> {
    let started_at = Instant::now();
    if matrix.n() != assignments.len() {
        return Err(ScanError::invalid_input(format!(
            "feature matrix has n={}; assignments have {}",
            matrix.n(),
            assignments.len()
        )));
    }

    let mut diagnostics = StageDiagnostics::for_stage("evaluate");
    diagnostics.n = matrix.n();

    let clustered = clustered_indices(assignments);
    let clusters = assignments.members_by_cluster();
    let defined = clustered.len() >= 2
        && clusters.len() >= 2
        && clusters.len() < clustered.len();

    let metrics = if defined {
        let metrics = ClusteringMetrics {
            silhouette: silhouette_score(matrix, assignments)?,
            davies_bouldin: davies_bouldin_score(matrix, assignments)?,
            calinski_harabasz: calinski_harabasz_score(matrix, assignments)?,
            evaluated_points: clustered.len(),
            evaluated_clusters: clusters.len(),
        };
        diagnostics.notes.push(format!(
            "silhouette={:.6}, davies_bouldin={:.6}, calinski_harabasz={:.6}",
            metrics.silhouette, metrics.davies_bouldin, metrics.calinski_harabasz
        ));
        diagnostics.notes.push(format!(
            "evaluated_points={}, evaluated_clusters={}",
            metrics.evaluated_points, metrics.evaluated_clusters
        ));
        Some(metrics)
    } else {
        diagnostics.warnings.push(format!(
            "quality metrics undefined: {} non-noise points in {} clusters",
            clustered.len(),
            clusters.len()
        ));
        None
    };
    diagnostics.runtime_ms = elapsed_ms(started_at);

    Ok(EvaluationOutcome {
        metrics,
        diagnostics,
    })
}

/// Mean silhouette coefficient over non-noise points.
///
/// A point in a singleton cluster contributes 0. Requires the cluster count
/// to sit strictly between 1 and the number of evaluated points.
pub fn silhouette_score(
    matrix: &FeatureMatrix,
    assignments: &ClusterAssignments,
) -> Result<f64, ScanError> {
    let clusters = require_clustered(matrix, assignments)?;
    let clustered: usize = clusters.values().map(Vec::len).sum();
    if clusters.len() >= clustered {
        return Err(ScanError::invalid_input(format!(
            "silhouette is undefined for {} clusters over {} points",
            clusters.len(),
            clustered
        )));
    }

    let mut total = 0.0;
    for (cluster, members) in &clusters {
        for &i in members {
            if members.len() == 1 {
                continue;
            }

            let own: f64 = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| matrix.row_distance_sq(i, j).sqrt())
                .sum();
            let a = own / (members.len() - 1) as f64;

            let mut b = f64::INFINITY;
            for (other, other_members) in &clusters {
                if other == cluster {
                    continue;
                }
                let sum: f64 = other_members
                    .iter()
                    .map(|&j| matrix.row_distance_sq(i, j).sqrt())
                    .sum();
                b = b.min(sum / other_members.len() as f64);
            }

            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }
    }

    finite(total / clustered as f64, "silhouette")
}

/// Davies-Bouldin index over non-noise points. Lower is tighter.
pub fn davies_bouldin_score(
    matrix: &FeatureMatrix,
    assignments: &ClusterAssignments,
) -> Result<f64, ScanError> {
    let clusters = require_clustered(matrix, assignments)?;
    let centroids: Vec<Vec<f64>> = clusters
        .values()
        .map(|members| centroid(matrix, members))
        .collect();
    let dispersions: Vec<f64> = clusters
        .values()
        .zip(&centroids)
        .map(|(members, center)| {
            members
                .iter()
                .map(|&i| point_distance(matrix.row(i), center))
                .sum::<f64>()
                / members.len() as f64
        })
        .collect();

    let k = centroids.len();
    if dispersions.iter().all(|&s| s == 0.0) {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for i in 0..k {
        let mut worst = 0.0f64;
        for j in 0..k {
            if i == j {
                continue;
            }
            let separation = point_distance(&centroids[i], &centroids[j]);
            if separation > 0.0 {
                worst = worst.max((dispersions[i] + dispersions[j]) / separation);
            }
        }
        total += worst;
    }

    finite(total / k as f64, "davies-bouldin")
}

/// Calinski-Harabasz score over non-noise points. Higher is tighter.
///
/// Degenerates to 1.0 when every cluster collapses to a single point in
/// feature space.
pub fn calinski_harabasz_score(
    matrix: &FeatureMatrix,
    assignments: &ClusterAssignments,
) -> Result<f64, ScanError> {
    let clusters = require_clustered(matrix, assignments)?;
    let clustered: Vec<usize> = clusters.values().flatten().copied().collect();
    let overall = centroid(matrix, &clustered);

    let mut between = 0.0;
    let mut within = 0.0;
    for members in clusters.values() {
        let center = centroid(matrix, members);
        between += members.len() as f64 * point_distance_sq(&center, &overall);
        within += members
            .iter()
            .map(|&i| point_distance_sq(matrix.row(i), &center))
            .sum::<f64>();
    }

    if within == 0.0 {
        return Ok(1.0);
    }

    let n = clustered.len() as f64;
    let k = clusters.len() as f64;
    finite(
        between * (n - k) / (within * (k - 1.0)),
        "calinski-harabasz",
    )
}

fn require_clustered(
    matrix: &FeatureMatrix,
    assignments: &ClusterAssignments,
) -> Result<BTreeMap<i32, Vec<usize>>, ScanError> {
    if matrix.n() != assignments.len() {
        return Err(ScanError::invalid_input(format!(
            "feature matrix has n={}; assignments have {}",
            matrix.n(),
            assignments.len()
        )));
    }
    let clusters = assignments.members_by_cluster();
    if clusters.len() < 2 {
        return Err(ScanError::invalid_input(format!(
            "quality metrics need at least 2 clusters; got {}",
            clusters.len()
        )));
    }
    Ok(clusters)
}

fn clustered_indices(assignments: &ClusterAssignments) -> Vec<usize> {
    (0..assignments.len())
        .filter(|&i| !assignments.is_noise(i))
        .collect()
}

fn centroid(matrix: &FeatureMatrix, members: &[usize]) -> Vec<f64> {
    let mut center = vec![0.0; matrix.d()];
    for &i in members {
        for (j, value) in matrix.row(i).iter().enumerate() {
            center[j] += value;
        }
    }
    for value in &mut center {
        *value /= members.len() as f64;
    }
    center
}

fn point_distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

fn point_distance(a: &[f64], b: &[f64]) -> f64 {
    point_distance_sq(a, b).sqrt()
}

fn finite(value: f64, metric: &str) -> Result<f64, ScanError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScanError::numerical_issue(format!(
            "{metric} score is not finite"
        )))
    }
}

fn elapsed_ms(started_at: Instant) -> Option<u64> {
    u64::try_from(started_at.elapsed().as_millis()).ok()
}

/// Evaluation utilities crate name helper.
pub fn crate_name() -> &'static str {
    let _ = skyscan_core::crate_name();
    "skyscan-eval"
}
