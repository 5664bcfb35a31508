//! Core domain types for live frame quality gating.

mod assessment;
mod detection;
mod error;
mod frame;
mod gate;

pub use assessment::{Award, Criterion, PhotometricStats, QualityAssessment};
pub use detection::{
    BoundingBox, DetectionResult, FaceAttributes, HeadPose, Landmarks, Point, QualityScores,
};
pub(crate) use detection::clamp_unit;
pub use error::{AnalysisFailure, DeviceError, SessionError};
pub use frame::{luma, EncodedImage, Frame, PixelLayout, StillFormat};
pub use gate::{CaptureGate, CaptureGateState, GateTransition};
