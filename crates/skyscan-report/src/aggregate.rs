// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_core::{
    AnomalyFlag, ClusterAssignments, ObjectCategory, ScanError, StageDiagnostics,
};
use std::collections::BTreeMap;
use std::time::Instant;

/// Anomaly share of one object category across the whole population.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryRate {
    pub category: ObjectCategory,
    pub anomaly_count: usize,
    pub total_count: usize,
    pub rate_percent: f64,
}

/// Anomaly share of one cluster, noise included.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterRate {
    pub cluster: i32,
    pub anomaly_count: usize,
    pub total_count: usize,
    pub rate_percent: f64,
}

/// Both rate tables plus the aggregation stage record.
#[derive(Clone, Debug, PartialEq)]
pub struct RateReport {
    pub by_category: Vec<CategoryRate>,
    pub by_cluster: Vec<ClusterRate>,
    pub diagnostics: StageDiagnostics,
}

/// Anomaly rates per object category, in category-name order.
///
/// The denominator is every labeled object, including noise members that were
/// never eligible for scoring. Categories with no members are omitted;
/// categories with members but no anomalies appear with a rate of exactly 0.
pub fn anomaly_rates_by_category(
    categories: &[ObjectCategory],
    flags: &[AnomalyFlag],
) -> Result<Vec<CategoryRate>, ScanError> {
    if categories.len() != flags.len() {
        return Err(ScanError::invalid_input(format!(
            "category vector has {} entries; flags have {}",
            categories.len(),
            flags.len()
        )));
    }

    let mut counts: BTreeMap<&'static str, (ObjectCategory, usize, usize)> = BTreeMap::new();
    for (category, flag) in categories.iter().zip(flags) {
        let slot = counts
            .entry(category.as_str())
            .or_insert((*category, 0, 0));
        slot.2 += 1;
        if flag.is_anomaly() {
            slot.1 += 1;
        }
    }

    Ok(counts
        .into_values()
        .map(|(category, anomaly_count, total_count)| CategoryRate {
            category,
            anomaly_count,
            total_count,
            rate_percent: percent(anomaly_count, total_count),
        })
        .collect())
}

/// Anomaly rates per cluster id, ascending, with the noise row first.
///
/// Noise members always carry a zero count, so the noise row reads as a rate
/// of exactly 0; it is kept because its total still describes the population.
pub fn cluster_contamination_rates(
    assignments: &ClusterAssignments,
    flags: &[AnomalyFlag],
) -> Result<Vec<ClusterRate>, ScanError> {
    if assignments.len() != flags.len() {
        return Err(ScanError::invalid_input(format!(
            "assignments have {} entries; flags have {}",
            assignments.len(),
            flags.len()
        )));
    }

    let mut counts: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for (row, flag) in flags.iter().enumerate() {
        let slot = counts.entry(assignments.label(row)).or_insert((0, 0));
        slot.1 += 1;
        if flag.is_anomaly() {
            slot.0 += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|(cluster, (anomaly_count, total_count))| ClusterRate {
            cluster,
            anomaly_count,
            total_count,
            rate_percent: percent(anomaly_count, total_count),
        })
        .collect())
}

/// Builds both rate tables in one pass with stage diagnostics.
pub fn aggregate_rates(
    categories: &[ObjectCategory],
    assignments: &ClusterAssignments,
    flags: &[AnomalyFlag],
) -> Result<RateReport, ScanError> {
    let started_at = Instant::now();
    let by_category = anomaly_rates_by_category(categories, flags)?;
    let by_cluster = cluster_contamination_rates(assignments, flags)?;

    let mut diagnostics = StageDiagnostics::for_stage("aggregate");
    diagnostics.n = flags.len();
    diagnostics.runtime_ms = elapsed_ms(started_at);
    diagnostics.notes.push(format!(
        "categories={}, clusters={}",
        by_category.len(),
        by_cluster.len()
    ));

    Ok(RateReport {
        by_category,
        by_cluster,
        diagnostics,
    })
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn elapsed_ms(started_at: Instant) -> Option<u64> {
    u64::try_from(started_at.elapsed().as_millis()).ok()
}
