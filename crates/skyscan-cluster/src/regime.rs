// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_core::{ClusterAssignments, ScanError, StageDiagnostics};
use std::collections::BTreeMap;
use std::time::Instant;

/// Mean-motion boundaries for orbit-regime classification, in revolutions
/// per day.
///
/// LEO is checked before the GEO band, so an overlapping configuration
/// resolves in favor of the faster regime.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegimeThresholds {
    pub leo_min_rev_day: f64,
    pub meo_min_rev_day: f64,
    pub geo_center_rev_day: f64,
    pub geo_tolerance_rev_day: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            leo_min_rev_day: 12.0,
            meo_min_rev_day: 2.0,
            geo_center_rev_day: 1.0,
            geo_tolerance_rev_day: 0.2,
        }
    }
}

impl RegimeThresholds {
    pub fn validate(&self) -> Result<(), ScanError> {
        for (name, value) in [
            ("leo_min_rev_day", self.leo_min_rev_day),
            ("meo_min_rev_day", self.meo_min_rev_day),
            ("geo_center_rev_day", self.geo_center_rev_day),
            ("geo_tolerance_rev_day", self.geo_tolerance_rev_day),
        ] {
            if !value.is_finite() {
                return Err(ScanError::invalid_input(format!(
                    "RegimeThresholds.{name} must be finite; got {value}"
                )));
            }
        }
        if self.leo_min_rev_day <= self.meo_min_rev_day {
            return Err(ScanError::invalid_input(format!(
                "RegimeThresholds.leo_min_rev_day ({}) must exceed meo_min_rev_day ({})",
                self.leo_min_rev_day, self.meo_min_rev_day
            )));
        }
        if self.geo_tolerance_rev_day <= 0.0 {
            return Err(ScanError::invalid_input(format!(
                "RegimeThresholds.geo_tolerance_rev_day must be > 0; got {}",
                self.geo_tolerance_rev_day
            )));
        }
        Ok(())
    }
}

/// Orbital regime assigned to a cluster from its mean mean motion.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum OrbitRegime {
    Leo,
    Meo,
    Geo,
    #[default]
    Unclassified,
}

impl OrbitRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leo => "LEO",
            Self::Meo => "MEO",
            Self::Geo => "GEO",
            Self::Unclassified => "Unclassified",
        }
    }

    /// Human-readable description attached to report rows.
    pub fn comment(&self) -> &'static str {
        match self {
            Self::Leo => {
                "Low Earth Orbit (LEO): Fast orbits, typically debris or small satellites (close to Earth)."
            }
            Self::Meo => {
                "Medium Earth Orbit (MEO): Medium-altitude, often navigation satellites like GPS/BeiDou."
            }
            Self::Geo => {
                "Geostationary Orbit (GEO): Communication/TV satellites, appear fixed above Earth."
            }
            Self::Unclassified => {
                "Does not match typical orbital regimes; may be elliptical, transfer, or decaying orbits."
            }
        }
    }
}

impl std::fmt::Display for OrbitRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a single mean motion, in revolutions per day.
///
/// A NaN input (an empty cluster average, for instance) falls through every
/// band and comes back `Unclassified`.
pub fn classify_mean_motion(mean_motion_rev_day: f64, thresholds: &RegimeThresholds) -> OrbitRegime {
    if mean_motion_rev_day.is_nan() {
        return OrbitRegime::Unclassified;
    }
    if mean_motion_rev_day > thresholds.leo_min_rev_day {
        return OrbitRegime::Leo;
    }
    if mean_motion_rev_day > thresholds.meo_min_rev_day {
        return OrbitRegime::Meo;
    }
    if (mean_motion_rev_day - thresholds.geo_center_rev_day).abs()
        < thresholds.geo_tolerance_rev_day
    {
        return OrbitRegime::Geo;
    }
    OrbitRegime::Unclassified
}

/// One cluster's regime summary.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterRegime {
    pub cluster: i32,
    pub size: usize,
    pub mean_mean_motion: f64,
    pub regime: OrbitRegime,
}

/// Regime labels for every real cluster, ascending by cluster id.
#[derive(Clone, Debug, PartialEq)]
pub struct RegimeLabeling {
    pub clusters: Vec<ClusterRegime>,
    pub diagnostics: StageDiagnostics,
}

impl RegimeLabeling {
    pub fn regime_of(&self, cluster: i32) -> Option<OrbitRegime> {
        self.clusters
            .iter()
            .find(|c| c.cluster == cluster)
            .map(|c| c.regime)
    }

    pub fn mean_mean_motion_of(&self, cluster: i32) -> Option<f64> {
        self.clusters
            .iter()
            .find(|c| c.cluster == cluster)
            .map(|c| c.mean_mean_motion)
    }
}

/// Labels clusters with orbital regimes from per-cluster mean motion.
///
/// Noise points never form a labeled group; they keep their noise id and get
/// no regime row.
#[derive(Clone, Debug)]
pub struct RegimeClassifier {
    thresholds: RegimeThresholds,
}

impl RegimeClassifier {
    pub fn new(thresholds: RegimeThresholds) -> Result<Self, ScanError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &RegimeThresholds {
        &self.thresholds
    }

    /// Averages `mean_motions` per cluster and classifies each average.
    ///
    /// `mean_motions` is parallel to the assignment labels.
    pub fn label(
        &self,
        mean_motions: &[f64],
        assignments: &ClusterAssignments,
    ) -> Result<RegimeLabeling, ScanError> {
        let started_at = Instant::now();
        if mean_motions.len() != assignments.len() {
            return Err(ScanError::invalid_input(format!(
                "mean motion vector has {} entries; assignments have {}",
                mean_motions.len(),
                assignments.len()
            )));
        }

        let members = assignments.members_by_cluster();
        let mut clusters = Vec::with_capacity(members.len());
        let mut regime_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (cluster, rows) in &members {
            let sum: f64 = rows.iter().map(|&i| mean_motions[i]).sum();
            let mean = sum / rows.len() as f64;
            if !mean.is_finite() {
                return Err(ScanError::numerical_issue(format!(
                    "cluster {cluster} mean motion average is not finite"
                )));
            }
            let regime = classify_mean_motion(mean, &self.thresholds);
            *regime_counts.entry(regime.as_str()).or_insert(0) += 1;
            clusters.push(ClusterRegime {
                cluster: *cluster,
                size: rows.len(),
                mean_mean_motion: mean,
                regime,
            });
        }

        let mut diagnostics = StageDiagnostics::for_stage("classify_regimes");
        diagnostics.n = assignments.len();
        diagnostics.runtime_ms = elapsed_ms(started_at);
        for (regime, count) in &regime_counts {
            diagnostics.notes.push(format!("{regime}={count}"));
        }
        if clusters.is_empty() {
            diagnostics
                .warnings
                .push("no clusters to label; population is all noise".to_string());
        }

        Ok(RegimeLabeling {
            clusters,
            diagnostics,
        })
    }
}

fn elapsed_ms(started_at: Instant) -> Option<u64> {
    u64::try_from(started_at.elapsed().as_millis()).ok()
}
