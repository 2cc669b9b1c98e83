// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod explain;

pub use aggregate::{
    aggregate_rates, anomaly_rates_by_category, cluster_contamination_rates, CategoryRate,
    ClusterRate, RateReport,
};
pub use explain::{explain_anomalies, reason_for, AnomalyExplanation, ExplanationReport};

/// Reporting namespace placeholder.
pub fn crate_name() -> &'static str {
    let _ = skyscan_core::crate_name();
    "skyscan-report"
}
