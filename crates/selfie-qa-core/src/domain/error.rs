//! Error taxonomy for the live path.
//!
//! Only [`DeviceError`] and [`SessionError`] ever reach a caller.
//! [`AnalysisFailure`]s stay inside a scheduler tick: they are logged, reported
//! as events, and the previous assessment is kept.

use std::time::Duration;

use thiserror::Error;

/// Failure of the capture device. Fatal to the live path until retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// No device, or the device went away.
    #[error("capture device unavailable: {0}")]
    Unavailable(String),
    /// The user or platform refused access.
    #[error("permission to use the capture device was denied: {0}")]
    PermissionDenied(String),
    /// A frame was requested before `start()` or after `stop()`.
    #[error("capture device is not started")]
    NotStarted,
    /// The device is running but could not produce a frame.
    #[error("failed to sample a frame: {0}")]
    SampleFailed(String),
}

/// Non-fatal failure of a single analysis tick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisFailure {
    /// Zero-sized frame or empty buffer.
    #[error("empty frame ({width}x{height})")]
    EmptyFrame {
        /// Reported width.
        width: u32,
        /// Reported height.
        height: u32,
    },
    /// Buffer shorter than the dimensions require.
    #[error("pixel buffer holds {actual} bytes, expected at least {expected}")]
    BufferSizeMismatch {
        /// Bytes required by the dimensions and layout.
        expected: usize,
        /// Bytes present.
        actual: usize,
    },
    /// The frame source failed while sampling for this tick.
    #[error("frame source failed: {0}")]
    Device(#[from] DeviceError),
    /// The detection provider did not answer within its latency budget.
    #[error("detection provider exceeded its {0:?} latency budget")]
    ProviderTimeout(Duration),
}

/// Misuse of a capture session, or failure while confirming a still.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The capture device failed.
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// Capture was requested while the gate is blocked.
    #[error("capture is not allowed while the gate is blocked")]
    NotEligible,
    /// The operation is not valid in the current phase.
    #[error("cannot {operation} while the session is {phase}")]
    InvalidPhase {
        /// The attempted operation.
        operation: &'static str,
        /// The phase the session was in.
        phase: &'static str,
    },
    /// The still could not be encoded.
    #[error("failed to encode still: {0:#}")]
    Encode(anyhow::Error),
    /// The confirmation sink rejected the still.
    #[error("confirmation sink failed: {0:#}")]
    Sink(anyhow::Error),
}
