//! Per-frame quality assessment types.

use serde::{Deserialize, Serialize};

use super::{BoundingBox, HeadPose};

/// Photometric statistics of a frame, each on a `[0,100]` scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotometricStats {
    /// Mean luma.
    pub brightness: f32,
    /// Luma range.
    pub contrast: f32,
    /// Sparse edge energy.
    pub sharpness: f32,
}

/// A rubric criterion, in evaluation order.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Brightness within the acceptable band.
    Lighting,
    /// Enough edge energy.
    Sharpness,
    /// Detector confidence.
    FaceConfidence,
    /// Face area relative to the frame.
    FaceSize,
    /// Head orientation.
    HeadPose,
    /// Eyes open.
    EyesOpen,
    /// Face centered in the frame.
    Centering,
}

impl Criterion {
    /// All criteria in evaluation order.
    pub const ALL: [Self; 7] = [
        Self::Lighting,
        Self::Sharpness,
        Self::FaceConfidence,
        Self::FaceSize,
        Self::HeadPose,
        Self::EyesOpen,
        Self::Centering,
    ];

    /// Maximum points the criterion can award.
    #[must_use]
    pub const fn max_points(self) -> u8 {
        match self {
            Self::Lighting | Self::Sharpness => 20,
            Self::FaceConfidence => 25,
            Self::FaceSize => 15,
            Self::HeadPose => 10,
            Self::EyesOpen | Self::Centering => 5,
        }
    }
}

/// Points awarded for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    /// The criterion.
    pub criterion: Criterion,
    /// Points awarded.
    pub points: u8,
    /// Maximum achievable points.
    pub max_points: u8,
}

/// Aggregated quality verdict for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Mean luma, `[0,100]`.
    pub brightness: f32,
    /// Luma range, `[0,100]`.
    pub contrast: f32,
    /// Edge energy, `[0,100]`.
    pub sharpness: f32,
    /// Whether a face was detected.
    pub face_detected: bool,
    /// Detector confidence, `[0,1]`.
    pub face_confidence: f32,
    /// Face area as a fraction of the frame.
    pub face_size: f32,
    /// Face location.
    pub bounding_box: BoundingBox,
    /// Head orientation.
    pub head_pose: HeadPose,
    /// Whether the eyes are open.
    pub eyes_open: bool,
    /// Sum of awarded points, `[0,100]`.
    pub overall_score: u8,
    /// Problems found, in rubric order.
    pub issues: Vec<String>,
    /// One recommendation per issue, same order.
    pub recommendations: Vec<String>,
    /// Per-criterion awards, in rubric order.
    pub breakdown: Vec<Award>,
}

impl QualityAssessment {
    /// Points awarded for `criterion`.
    #[must_use]
    pub fn points_for(&self, criterion: Criterion) -> Option<u8> {
        self.breakdown
            .iter()
            .find(|a| a.criterion == criterion)
            .map(|a| a.points)
    }

    /// True when every criterion awarded its maximum.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.issues.is_empty()
    }
}
