// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_core::{FeatureMatrix, ScanError, StageDiagnostics};
use std::time::Instant;

/// Column-wise z-score scaler fitted once over the whole feature matrix.
///
/// A zero-variance column (including the n = 1 case, where the sample
/// standard deviation is undefined) is recorded with a stddev of 0 and
/// normalizes to exactly 0 rather than dividing by zero.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    stddevs: Vec<f64>,
}

impl StandardScaler {
    /// Fits per-column mean and sample (n-1) standard deviation.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self, ScanError> {
        let n = matrix.n();
        let d = matrix.d();
        if n == 0 {
            return Err(ScanError::empty_dataset(
                "cannot fit a scaler on an empty feature matrix",
            ));
        }

        let mut means = vec![0.0; d];
        for i in 0..n {
            for (j, value) in matrix.row(i).iter().enumerate() {
                means[j] += value;
            }
        }
        for mean in &mut means {
            *mean /= n as f64;
        }

        let mut stddevs = vec![0.0; d];
        if n >= 2 {
            for i in 0..n {
                for (j, value) in matrix.row(i).iter().enumerate() {
                    let centered = value - means[j];
                    stddevs[j] += centered * centered;
                }
            }
            for stddev in &mut stddevs {
                *stddev = (*stddev / (n as f64 - 1.0)).sqrt();
                if !stddev.is_finite() {
                    return Err(ScanError::numerical_issue(
                        "scaler variance overflowed to a non-finite value",
                    ));
                }
            }
        }

        Ok(Self { means, stddevs })
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stddevs(&self) -> &[f64] {
        &self.stddevs
    }

    /// Applies the fitted parameters to every row identically.
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, ScanError> {
        if matrix.d() != self.means.len() {
            return Err(ScanError::invalid_input(format!(
                "scaler was fitted on d={} columns; got a matrix with d={}",
                self.means.len(),
                matrix.d()
            )));
        }

        let mut values = Vec::with_capacity(matrix.n() * matrix.d());
        for i in 0..matrix.n() {
            for (j, value) in matrix.row(i).iter().enumerate() {
                let stddev = self.stddevs[j];
                if stddev > 0.0 {
                    values.push((value - self.means[j]) / stddev);
                } else {
                    values.push(0.0);
                }
            }
        }
        FeatureMatrix::new(values, matrix.n(), matrix.columns().to_vec())
    }

    /// Fits on `matrix` and transforms it, with stage diagnostics.
    pub fn fit_transform(
        matrix: &FeatureMatrix,
    ) -> Result<(Self, FeatureMatrix, StageDiagnostics), ScanError> {
        let started_at = Instant::now();
        let scaler = Self::fit(matrix)?;
        let normalized = scaler.transform(matrix)?;

        let mut diagnostics = StageDiagnostics::for_stage("normalize");
        diagnostics.n = matrix.n();
        diagnostics.runtime_ms = crate::extract::elapsed_ms(started_at);
        for (j, column) in matrix.columns().iter().enumerate() {
            diagnostics.notes.push(format!(
                "{}: mean={:.6}, stddev={:.6}",
                column.as_str(),
                scaler.means[j],
                scaler.stddevs[j]
            ));
            if scaler.stddevs[j] <= 0.0 {
                diagnostics.warnings.push(format!(
                    "column '{}' has zero variance; normalized to 0",
                    column.as_str()
                ));
            }
        }

        Ok((scaler, normalized, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::StandardScaler;
    use skyscan_core::{FeatureColumn, FeatureMatrix};

    const TOL: f64 = 1e-9;

    fn matrix(values: Vec<f64>, n: usize, d: usize) -> FeatureMatrix {
        let columns = FeatureColumn::default_columns()[..d].to_vec();
        FeatureMatrix::new(values, n, columns).expect("test matrix should be valid")
    }

    fn column_stats(matrix: &FeatureMatrix, j: usize) -> (f64, f64) {
        let n = matrix.n() as f64;
        let mean = (0..matrix.n()).map(|i| matrix.row(i)[j]).sum::<f64>() / n;
        let var = (0..matrix.n())
            .map(|i| {
                let centered = matrix.row(i)[j] - mean;
                centered * centered
            })
            .sum::<f64>()
            / (n - 1.0);
        (mean, var.sqrt())
    }

    #[test]
    fn fit_transform_round_trips_to_zero_mean_unit_stddev() {
        let raw = matrix(
            vec![
                98.0, 0.0010, 14.20, //
                97.5, 0.0012, 14.10, //
                98.5, 0.0008, 14.30, //
                53.0, 0.0002, 15.50, //
            ],
            4,
            3,
        );
        let (_, normalized, _) =
            StandardScaler::fit_transform(&raw).expect("fit_transform should succeed");

        for j in 0..3 {
            let (mean, stddev) = column_stats(&normalized, j);
            assert!(mean.abs() < TOL, "column {j} mean {mean} not ~0");
            assert!((stddev - 1.0).abs() < TOL, "column {j} stddev {stddev} not ~1");
        }
    }

    #[test]
    fn zero_variance_column_normalizes_to_exactly_zero() {
        let raw = matrix(
            vec![
                98.0, 0.5, 14.2, //
                97.0, 0.5, 14.4, //
                99.0, 0.5, 14.0, //
            ],
            3,
            3,
        );
        let (scaler, normalized, diagnostics) =
            StandardScaler::fit_transform(&raw).expect("fit_transform should succeed");

        assert_eq!(scaler.stddevs()[1], 0.0);
        for i in 0..3 {
            assert_eq!(normalized.row(i)[1], 0.0);
        }
        assert!(diagnostics
            .warnings
            .iter()
            .any(|w| w.contains("zero variance")));
    }

    #[test]
    fn single_row_matrix_normalizes_every_column_to_zero() {
        let raw = matrix(vec![98.0, 0.001, 14.2], 1, 3);
        let (scaler, normalized, _) =
            StandardScaler::fit_transform(&raw).expect("fit_transform should succeed");
        assert_eq!(scaler.stddevs(), &[0.0, 0.0, 0.0]);
        assert_eq!(normalized.row(0), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn transform_rejects_mismatched_dimensions() {
        let raw = matrix(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let scaler = StandardScaler::fit(&raw).expect("fit should succeed");
        let narrow = matrix(vec![1.0, 2.0], 2, 1);
        let err = scaler
            .transform(&narrow)
            .expect_err("dimension mismatch should fail");
        assert!(err.to_string().contains("fitted on d=3"));
    }

    #[test]
    fn parameters_are_fitted_once_over_the_whole_batch() {
        let raw = matrix(vec![1.0, 0.0, 0.0, 3.0, 0.0, 0.0], 2, 3);
        let scaler = StandardScaler::fit(&raw).expect("fit should succeed");
        assert!((scaler.means()[0] - 2.0).abs() < TOL);
        // Sample stddev of {1, 3} is sqrt(2).
        assert!((scaler.stddevs()[0] - 2.0_f64.sqrt()).abs() < TOL);
    }
}
