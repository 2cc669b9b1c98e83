// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use skyscan_core::{ClusterAssignments, FeatureMatrix, ScanError, StageDiagnostics, NOISE_CLUSTER};
use std::collections::VecDeque;
use std::time::Instant;

const DEFAULT_EPS: f64 = 0.6;
const DEFAULT_MIN_POINTS: usize = 50;

/// Configuration for [`Dbscan`].
///
/// Defaults are tuned for standardized orbital features; a point's own row
/// counts toward its neighborhood size.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DbscanConfig {
    pub eps: f64,
    pub min_points: usize,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

impl DbscanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(ScanError::invalid_input(format!(
                "DbscanConfig.eps must be finite and > 0; got {}",
                self.eps
            )));
        }
        if self.min_points == 0 {
            return Err(ScanError::invalid_input(
                "DbscanConfig.min_points must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Result of one clustering run.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterOutcome {
    pub assignments: ClusterAssignments,
    pub diagnostics: StageDiagnostics,
}

/// Density-based clustering engine.
///
/// A point belongs to cluster C when it is density-reachable from a core
/// point of C; points reachable from no core point are labeled
/// [`NOISE_CLUSTER`]. Given identical input order and parameters the labels
/// are identical across runs: seeds are visited in row order, neighborhoods
/// are enumerated in row order, and expansion is breadth-first.
#[derive(Clone, Debug)]
pub struct Dbscan {
    config: DbscanConfig,
}

impl Dbscan {
    pub fn new(config: DbscanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DbscanConfig {
        &self.config
    }

    pub fn fit(&self, x: &FeatureMatrix) -> Result<ClusterOutcome, ScanError> {
        let started_at = Instant::now();
        let n = x.n();
        if n == 0 {
            return Err(ScanError::empty_dataset(
                "cannot cluster an empty feature matrix",
            ));
        }

        let eps_sq = self.config.eps * self.config.eps;
        let neighborhoods = neighborhoods(x, eps_sq);

        let mut labels = vec![NOISE_CLUSTER; n];
        let mut visited = vec![false; n];
        let mut next_cluster: i32 = 0;

        for seed in 0..n {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;
            if neighborhoods[seed].len() < self.config.min_points {
                // Not a core point; stays noise unless a later cluster
                // reaches it as a border point.
                continue;
            }

            labels[seed] = next_cluster;
            let mut frontier: VecDeque<usize> = neighborhoods[seed].iter().copied().collect();
            while let Some(point) = frontier.pop_front() {
                if labels[point] == NOISE_CLUSTER {
                    labels[point] = next_cluster;
                }
                if visited[point] {
                    continue;
                }
                visited[point] = true;
                if neighborhoods[point].len() >= self.config.min_points {
                    frontier.extend(neighborhoods[point].iter().copied());
                }
            }

            next_cluster = next_cluster
                .checked_add(1)
                .ok_or_else(|| ScanError::resource_limit("cluster id counter overflow"))?;
        }

        let assignments = ClusterAssignments::new(labels)?;

        let mut diagnostics = StageDiagnostics::for_stage("cluster");
        diagnostics.n = n;
        diagnostics.runtime_ms = elapsed_ms(started_at);
        diagnostics.notes.push(format!(
            "algorithm=dbscan, eps={}, min_points={}",
            self.config.eps, self.config.min_points
        ));
        diagnostics.notes.push(format!(
            "clusters={}, noise={}",
            assignments.cluster_count(),
            assignments.noise_count()
        ));
        if assignments.cluster_count() == 0 {
            diagnostics
                .warnings
                .push("every point is noise; min_points may exceed the population density".to_string());
        }

        Ok(ClusterOutcome {
            assignments,
            diagnostics,
        })
    }
}

/// Epsilon-neighborhood index lists, self included, ascending row order.
fn neighborhoods(x: &FeatureMatrix, eps_sq: f64) -> Vec<Vec<usize>> {
    #[cfg(feature = "rayon")]
    {
        (0..x.n())
            .into_par_iter()
            .map(|i| row_neighborhood(x, i, eps_sq))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..x.n()).map(|i| row_neighborhood(x, i, eps_sq)).collect()
    }
}

fn row_neighborhood(x: &FeatureMatrix, i: usize, eps_sq: f64) -> Vec<usize> {
    (0..x.n())
        .filter(|&j| x.row_distance_sq(i, j) <= eps_sq)
        .collect()
}

fn elapsed_ms(started_at: Instant) -> Option<u64> {
    u64::try_from(started_at.elapsed().as_millis()).ok()
}
