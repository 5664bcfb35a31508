//! Result output port for writing assessment records.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::{CaptureGateState, QualityAssessment};

/// One assessment as written by an output adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentRecord {
    /// Where the frame came from, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Live tick number, for records produced by a running loop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    /// Gate state implied by the assessment.
    pub gate: CaptureGateState,
    /// The assessment.
    #[serde(flatten)]
    pub assessment: QualityAssessment,
}

/// Port for outputting assessment records.
pub trait ResultOutput: Send + Sync {
    /// Writes a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, record: &AssessmentRecord) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
