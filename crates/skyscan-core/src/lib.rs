// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod catalog;
pub mod cluster;
pub mod diagnostics;
pub mod error;
pub mod features;
pub mod observability;

pub use catalog::{classify_object_name, CatalogEntry, ObjectCategory, TlePair};
pub use cluster::{AnomalyFlag, ClusterAssignments, NOISE_CLUSTER};
pub use diagnostics::{StageDiagnostics, DIAGNOSTICS_SCHEMA_VERSION};
pub use error::ScanError;
pub use features::{FeatureColumn, FeatureMatrix, OrbitalFeatures};
pub use observability::{NoopProgressSink, PipelineStage, ProgressSink};

/// Core shared types and traits for skyscan.
pub fn crate_name() -> &'static str {
    "skyscan-core"
}
