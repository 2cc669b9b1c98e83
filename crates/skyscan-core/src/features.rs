// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::ScanError;

/// Orbital parameters derived from a parsed element pair.
///
/// Mean motion is in revolutions per day, converted from the propagation
/// model's radians-per-minute rate via `rate * 1440 / (2 * pi)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitalFeatures {
    pub inclination_deg: f64,
    pub eccentricity: f64,
    pub mean_motion_rev_day: f64,
}

impl OrbitalFeatures {
    pub fn column_value(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::Inclination => self.inclination_deg,
            FeatureColumn::Eccentricity => self.eccentricity,
            FeatureColumn::MeanMotion => self.mean_motion_rev_day,
        }
    }
}

/// Selectable feature dimensions for clustering and anomaly modeling.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureColumn {
    Inclination,
    Eccentricity,
    MeanMotion,
}

impl FeatureColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inclination => "inclination",
            Self::Eccentricity => "eccentricity",
            Self::MeanMotion => "mean_motion",
        }
    }

    /// Default column set, in report order.
    pub fn default_columns() -> Vec<FeatureColumn> {
        vec![Self::Inclination, Self::Eccentricity, Self::MeanMotion]
    }
}

/// Row-major n-by-d feature matrix with construction-time validation.
///
/// Rows keep the order of the accepted catalog entries; columns follow the
/// configured `FeatureColumn` selection.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    values: Vec<f64>,
    n: usize,
    d: usize,
    columns: Vec<FeatureColumn>,
}

impl FeatureMatrix {
    pub fn new(
        values: Vec<f64>,
        n: usize,
        columns: Vec<FeatureColumn>,
    ) -> Result<Self, ScanError> {
        let d = columns.len();
        if d == 0 {
            return Err(ScanError::invalid_input(
                "FeatureMatrix requires at least one column; got 0",
            ));
        }
        let expected = n
            .checked_mul(d)
            .ok_or_else(|| ScanError::resource_limit("feature matrix size overflow"))?;
        if values.len() != expected {
            return Err(ScanError::invalid_input(format!(
                "FeatureMatrix values length mismatch: expected n*d={expected}, got {}",
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ScanError::invalid_input(format!(
                "FeatureMatrix values must be finite; found non-finite value at row {}, column {}",
                pos / d,
                pos % d
            )));
        }

        Ok(Self {
            values,
            n,
            d,
            columns,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.d;
        &self.values[start..start + self.d]
    }

    /// Index of a column within the selection, when present.
    pub fn column_index(&self, column: FeatureColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// Copies one column out of the matrix.
    pub fn column(&self, index: usize) -> Result<Vec<f64>, ScanError> {
        if index >= self.d {
            return Err(ScanError::invalid_input(format!(
                "column index {index} out of range for d={}",
                self.d
            )));
        }
        Ok((0..self.n).map(|i| self.values[i * self.d + index]).collect())
    }

    /// Squared Euclidean distance between two rows.
    pub fn row_distance_sq(&self, a: usize, b: usize) -> f64 {
        let ra = self.row(a);
        let rb = self.row(b);
        ra.iter()
            .zip(rb.iter())
            .map(|(x, y)| {
                let diff = x - y;
                diff * diff
            })
            .sum()
    }
}
