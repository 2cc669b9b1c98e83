// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::tle::parse_tle_pair;
use skyscan_core::{
    CatalogEntry, FeatureColumn, FeatureMatrix, OrbitalFeatures, ScanError, StageDiagnostics,
};
use std::f64::consts::PI;
use std::time::Instant;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Configuration for [`FeatureExtractor`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureConfig {
    pub columns: Vec<FeatureColumn>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            columns: FeatureColumn::default_columns(),
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.columns.is_empty() {
            return Err(ScanError::invalid_input(
                "FeatureConfig.columns must name at least one column; got none",
            ));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(column) {
                return Err(ScanError::invalid_input(format!(
                    "FeatureConfig.columns lists '{}' more than once",
                    column.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Feature vectors for every catalog entry whose element pair parsed.
///
/// `accepted` holds indices into the input slice, in input order; `features`
/// and the matrix rows are parallel to it. Rejected entries appear only in
/// the skip count.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedPopulation {
    pub accepted: Vec<usize>,
    pub features: Vec<OrbitalFeatures>,
    pub matrix: FeatureMatrix,
    pub skipped: usize,
    pub diagnostics: StageDiagnostics,
}

/// Converts catalog entries with element pairs into orbital feature vectors.
#[derive(Clone, Debug)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Extracts feature vectors in input order.
    ///
    /// Entries with a missing or malformed element pair are skipped silently;
    /// only the aggregate count is retained. Fails with `EmptyDataset` when
    /// no entry parses, because no feature matrix exists to analyze.
    pub fn extract(&self, entries: &[CatalogEntry]) -> Result<ExtractedPopulation, ScanError> {
        let started_at = Instant::now();
        let mut accepted = Vec::new();
        let mut features = Vec::new();
        let mut skipped = 0usize;

        for (index, entry) in entries.iter().enumerate() {
            let pair = match &entry.tle {
                Some(pair) if entry.has_elements() => pair,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            match parse_tle_pair(&pair.line1, &pair.line2) {
                Ok(record) => {
                    accepted.push(index);
                    features.push(OrbitalFeatures {
                        inclination_deg: record.inclination_deg,
                        eccentricity: record.eccentricity,
                        mean_motion_rev_day: record.mean_motion_rad_min() * MINUTES_PER_DAY
                            / (2.0 * PI),
                    });
                }
                Err(_) => {
                    skipped += 1;
                }
            }
        }

        if accepted.is_empty() {
            return Err(ScanError::empty_dataset(
                "no catalog entries produced parseable element pairs",
            ));
        }

        let mut values = Vec::with_capacity(accepted.len() * self.config.columns.len());
        for feature in &features {
            for column in &self.config.columns {
                values.push(feature.column_value(*column));
            }
        }
        let matrix = FeatureMatrix::new(values, accepted.len(), self.config.columns.clone())?;

        let mut diagnostics = StageDiagnostics::for_stage("extract");
        diagnostics.n = entries.len();
        diagnostics.skipped = Some(skipped);
        diagnostics.runtime_ms = elapsed_ms(started_at);
        diagnostics.notes.push(format!("accepted={}", accepted.len()));
        diagnostics.notes.push(format!(
            "columns={}",
            self.config
                .columns
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",")
        ));

        Ok(ExtractedPopulation {
            accepted,
            features,
            matrix,
            skipped,
            diagnostics,
        })
    }
}

pub(crate) fn elapsed_ms(started_at: Instant) -> Option<u64> {
    u64::try_from(started_at.elapsed().as_millis()).ok()
}
