// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// The fixed stage sequence of the analysis pipeline.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Extract,
    Normalize,
    Cluster,
    Evaluate,
    ClassifyRegimes,
    DetectAnomalies,
    Explain,
    Aggregate,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Normalize => "normalize",
            Self::Cluster => "cluster",
            Self::Evaluate => "evaluate",
            Self::ClassifyRegimes => "classify_regimes",
            Self::DetectAnomalies => "detect_anomalies",
            Self::Explain => "explain",
            Self::Aggregate => "aggregate",
        }
    }

    /// Stages in execution order.
    pub const ALL: [PipelineStage; 8] = [
        Self::Extract,
        Self::Normalize,
        Self::Cluster,
        Self::Evaluate,
        Self::ClassifyRegimes,
        Self::DetectAnomalies,
        Self::Explain,
        Self::Aggregate,
    ];
}

/// Receiver for stage-boundary progress reports.
///
/// Implementations must tolerate being called once per completed stage with a
/// monotonically non-decreasing fraction in `[0, 1]`.
pub trait ProgressSink {
    fn on_stage_complete(&self, stage: PipelineStage, fraction: f32, detail: &str);
}

/// Sink that discards all progress reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn on_stage_complete(&self, _stage: PipelineStage, _fraction: f32, _detail: &str) {}
}
