// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_anomaly::AnomalyOutcome;
use skyscan_cluster::{OrbitRegime, RegimeLabeling};
use skyscan_core::{
    classify_object_name, CatalogEntry, ClusterAssignments, ObjectCategory, OrbitalFeatures,
    ScanError, StageDiagnostics,
};
use std::time::Instant;

/// One flagged object with its data-backed justification.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AnomalyExplanation {
    pub name: String,
    pub norad_id: u32,
    pub country: String,
    pub cluster: i32,
    pub regime: OrbitRegime,
    pub category: ObjectCategory,
    pub inclination_deg: f64,
    pub mean_motion_rev_day: f64,
    pub cluster_mean_mean_motion: Option<f64>,
    /// Signed offset from the cluster's mean mean motion, rev/day.
    pub deviation: Option<f64>,
    pub reason: &'static str,
    pub summary: String,
}

/// Explanations for every flagged row, in row order.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplanationReport {
    pub explanations: Vec<AnomalyExplanation>,
    pub diagnostics: StageDiagnostics,
}

/// Name-rule phrasing attached to each flagged object.
pub fn reason_for(category: ObjectCategory) -> &'static str {
    match category {
        ObjectCategory::Debris => "unusual orbital drift within its group (debris).",
        ObjectCategory::RocketBody => "might be tumbling or decaying (rocket body).",
        ObjectCategory::Satellite => "not moving like its neighbors (active satellite).",
    }
}

/// Builds one explanation per flagged row.
///
/// `accepted` maps feature rows back to catalog entries; `features` and the
/// assignment labels are parallel to it.
pub fn explain_anomalies(
    entries: &[CatalogEntry],
    accepted: &[usize],
    features: &[OrbitalFeatures],
    assignments: &ClusterAssignments,
    labeling: &RegimeLabeling,
    outcome: &AnomalyOutcome,
) -> Result<ExplanationReport, ScanError> {
    let started_at = Instant::now();
    if accepted.len() != features.len()
        || accepted.len() != assignments.len()
        || accepted.len() != outcome.flags.len()
    {
        return Err(ScanError::invalid_input(format!(
            "explanation inputs disagree on row count: accepted={}, features={}, labels={}, flags={}",
            accepted.len(),
            features.len(),
            assignments.len(),
            outcome.flags.len()
        )));
    }

    let mut explanations = Vec::new();
    for (row, flag) in outcome.flags.iter().enumerate() {
        if !flag.is_anomaly() {
            continue;
        }

        let entry_index = accepted[row];
        let entry = entries.get(entry_index).ok_or_else(|| {
            ScanError::invalid_input(format!(
                "accepted[{row}]={entry_index} is out of range for {} catalog entries",
                entries.len()
            ))
        })?;

        let cluster = assignments.label(row);
        let regime = labeling.regime_of(cluster).unwrap_or_default();
        let cluster_mean = labeling.mean_mean_motion_of(cluster);
        let feature = features[row];
        let deviation = cluster_mean.map(|mean| feature.mean_motion_rev_day - mean);
        let category = classify_object_name(&entry.name);
        let reason = reason_for(category);

        let summary = format!(
            "{} (NORAD {}) in Cluster {} [{}] : reason is {} inclination={:.3} deg, \
             mean_motion={:.3} rev/day, cluster_mean_mean_motion={:.3}, diff={:.3}",
            entry.name,
            entry.norad_id,
            cluster,
            regime,
            reason,
            feature.inclination_deg,
            feature.mean_motion_rev_day,
            cluster_mean.unwrap_or(f64::NAN),
            deviation.unwrap_or(f64::NAN),
        );

        explanations.push(AnomalyExplanation {
            name: entry.name.clone(),
            norad_id: entry.norad_id,
            country: entry.country.clone(),
            cluster,
            regime,
            category,
            inclination_deg: feature.inclination_deg,
            mean_motion_rev_day: feature.mean_motion_rev_day,
            cluster_mean_mean_motion: cluster_mean,
            deviation,
            reason,
            summary,
        });
    }

    let mut diagnostics = StageDiagnostics::for_stage("explain");
    diagnostics.n = outcome.flags.len();
    diagnostics.runtime_ms = elapsed_ms(started_at);
    diagnostics
        .notes
        .push(format!("explanations={}", explanations.len()));

    Ok(ExplanationReport {
        explanations,
        diagnostics,
    })
}

fn elapsed_ms(started_at: Instant) -> Option<u64> {
    u64::try_from(started_at.elapsed().as_millis()).ok()
}

#[cfg(test)]
mod tests {
    use super::{explain_anomalies, reason_for};
    use skyscan_anomaly::AnomalyOutcome;
    use skyscan_cluster::{ClusterRegime, OrbitRegime, RegimeLabeling};
    use skyscan_core::{
        AnomalyFlag, CatalogEntry, ClusterAssignments, ObjectCategory, OrbitalFeatures,
        StageDiagnostics,
    };

    fn entry(name: &str, norad: u32) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            norad_id: norad,
            country: "US".to_string(),
            launch_date: "2019-05-24".to_string(),
            tle: None,
        }
    }

    fn feature(mm: f64) -> OrbitalFeatures {
        OrbitalFeatures {
            inclination_deg: 53.0,
            eccentricity: 0.001,
            mean_motion_rev_day: mm,
        }
    }

    fn labeling() -> RegimeLabeling {
        RegimeLabeling {
            clusters: vec![ClusterRegime {
                cluster: 0,
                size: 3,
                mean_mean_motion: 14.0,
                regime: OrbitRegime::Leo,
            }],
            diagnostics: StageDiagnostics::for_stage("classify_regimes"),
        }
    }

    fn outcome(flags: Vec<AnomalyFlag>) -> AnomalyOutcome {
        let scores = flags
            .iter()
            .map(|f| f.is_anomaly().then_some(0.9))
            .collect();
        AnomalyOutcome {
            flags,
            scores,
            evaluated_clusters: vec![0],
            diagnostics: StageDiagnostics::for_stage("detect_anomalies"),
        }
    }

    #[test]
    fn reasons_follow_name_category_rules() {
        assert!(reason_for(ObjectCategory::Debris).contains("orbital drift"));
        assert!(reason_for(ObjectCategory::RocketBody).contains("tumbling or decaying"));
        assert!(reason_for(ObjectCategory::Satellite).contains("not moving like its neighbors"));
    }

    #[test]
    fn only_flagged_rows_produce_explanations() {
        let entries = vec![
            entry("STARLINK-1000", 1),
            entry("COSMOS 2251 DEB", 2),
            entry("SL-16 R/B", 3),
        ];
        let accepted = vec![0, 1, 2];
        let features = vec![feature(14.1), feature(14.9), feature(13.9)];
        let assignments = ClusterAssignments::new(vec![0, 0, 0]).expect("valid labels");
        let outcome = outcome(vec![
            AnomalyFlag::Normal,
            AnomalyFlag::Anomaly,
            AnomalyFlag::Normal,
        ]);

        let report = explain_anomalies(
            &entries,
            &accepted,
            &features,
            &assignments,
            &labeling(),
            &outcome,
        )
        .expect("explanation should succeed");

        assert_eq!(report.explanations.len(), 1);
        let explanation = &report.explanations[0];
        assert_eq!(explanation.name, "COSMOS 2251 DEB");
        assert_eq!(explanation.category, ObjectCategory::Debris);
        assert_eq!(explanation.regime, OrbitRegime::Leo);
        assert_eq!(explanation.cluster_mean_mean_motion, Some(14.0));
        let deviation = explanation.deviation.expect("cluster mean is known");
        assert!((deviation - 0.9).abs() < 1e-12);
    }

    #[test]
    fn summary_embeds_the_factual_fields() {
        let entries = vec![entry("SL-16 R/B", 22803)];
        let accepted = vec![0];
        let features = vec![feature(13.5)];
        let assignments = ClusterAssignments::new(vec![0]).expect("valid labels");
        let outcome = outcome(vec![AnomalyFlag::Anomaly]);

        let report = explain_anomalies(
            &entries,
            &accepted,
            &features,
            &assignments,
            &labeling(),
            &outcome,
        )
        .expect("explanation should succeed");

        let summary = &report.explanations[0].summary;
        assert!(summary.contains("SL-16 R/B (NORAD 22803) in Cluster 0 [LEO]"));
        assert!(summary.contains("might be tumbling or decaying (rocket body)."));
        assert!(summary.contains("mean_motion=13.500 rev/day"));
        assert!(summary.contains("cluster_mean_mean_motion=14.000"));
        assert!(summary.contains("diff=-0.500"));
    }

    #[test]
    fn mismatched_input_lengths_are_rejected() {
        let entries = vec![entry("SAT", 1)];
        let assignments = ClusterAssignments::new(vec![0]).expect("valid labels");
        let err = explain_anomalies(
            &entries,
            &[0, 1],
            &[feature(14.0)],
            &assignments,
            &labeling(),
            &outcome(vec![AnomalyFlag::Normal]),
        )
        .expect_err("length mismatch should fail");
        assert!(err.to_string().contains("disagree on row count"));
    }
}
