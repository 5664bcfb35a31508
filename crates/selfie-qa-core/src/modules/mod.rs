//! Frame analysis modules.
//!
//! Each module is a pure computation over a [`Frame`](crate::domain::Frame)
//! or over the outputs of other modules. None of them perform I/O.

mod face_region;
mod photometric;
mod scoring;

pub use face_region::{is_skin, FaceRegion, FaceRegionConfig, FaceRegionEstimator};
pub use photometric::{AnalyzerConfig, FrameAnalyzer, PhotometricAnalysis};
pub use scoring::{QualityScorer, ScoringConfig};
