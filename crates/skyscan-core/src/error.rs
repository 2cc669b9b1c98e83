// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Error taxonomy shared by every pipeline stage.
///
/// Per-record TLE parse failures are recovered locally by the feature
/// extractor and never surface through this type; only batch-level failures
/// do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanError {
    /// A caller-supplied value or configuration field is out of contract.
    InvalidInput(String),
    /// A computation produced a value outside its numeric domain.
    NumericalIssue(String),
    /// No usable records remain; the pipeline cannot proceed.
    EmptyDataset(String),
    /// The requested combination of options is not supported.
    NotSupported(String),
    /// An internal counter or allocation limit was exceeded.
    ResourceLimit(String),
}

impl ScanError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    pub fn empty_dataset(msg: impl Into<String>) -> Self {
        Self::EmptyDataset(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    pub fn resource_limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimit(msg.into())
    }

    /// Stable machine-readable code for structured error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NumericalIssue(_) => "numerical_issue",
            Self::EmptyDataset(_) => "empty_dataset",
            Self::NotSupported(_) => "not_supported",
            Self::ResourceLimit(_) => "resource_limit",
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NumericalIssue(msg) => write!(f, "numerical issue: {msg}"),
            Self::EmptyDataset(msg) => write!(f, "empty dataset: {msg}"),
            Self::NotSupported(msg) => write!(f, "not supported: {msg}"),
            Self::ResourceLimit(msg) => write!(f, "resource limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for ScanError {}
