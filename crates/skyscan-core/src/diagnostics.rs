// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::borrow::Cow;

/// Diagnostics schema version for stage run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured diagnostics captured from one pipeline stage execution.
///
/// Skip counts and degraded preconditions land in `notes`/`warnings` and the
/// dedicated `skipped` counter instead of being raised as errors.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct StageDiagnostics {
    pub stage: Cow<'static, str>,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    /// Rows entering the stage.
    pub n: usize,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub seed: Option<u64>,
    /// Records dropped by the stage, when dropping is part of its contract.
    pub skipped: Option<usize>,
}

impl StageDiagnostics {
    pub fn for_stage(stage: impl Into<Cow<'static, str>>) -> Self {
        Self {
            stage: stage.into(),
            ..Self::default()
        }
    }
}

impl Default for StageDiagnostics {
    fn default() -> Self {
        Self {
            stage: Cow::Borrowed(""),
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            n: 0,
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            seed: None,
            skipped: None,
        }
    }
}
