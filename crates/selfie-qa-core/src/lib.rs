//! Selfie QA Core - live frame quality gating
//!
//! This crate contains the domain types, the photometric and face region
//! analysis modules, the quality rubric, the port traits adapters implement,
//! and the live analysis loop that drives the capture gate.

pub mod domain;
pub mod live;
pub mod modules;
pub mod ports;
pub mod providers;

pub use domain::{
    AnalysisFailure, CaptureGateState, DetectionResult, DeviceError, EncodedImage, Frame,
    QualityAssessment, SessionError, StillFormat,
};
pub use live::{CaptureSession, LiveComponents, LiveState, LoopConfig, SessionConfig, SessionPhase};
pub use ports::{ConfirmationSink, DetectionProvider, FrameSource, LiveEvent, LiveEventSink};
