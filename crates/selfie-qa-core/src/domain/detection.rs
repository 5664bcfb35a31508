//! Face detection results.
//!
//! Field names follow the remote detection wire contract so local and remote
//! providers produce the same JSON.

use serde::{Deserialize, Serialize};

/// Normalized rectangle locating a face within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge, `[0,1]`.
    pub x: f32,
    /// Top edge, `[0,1]`.
    pub y: f32,
    /// Width, `[0,1]`.
    pub width: f32,
    /// Height, `[0,1]`.
    pub height: f32,
}

impl BoundingBox {
    /// Box reported whenever no face is detected.
    pub const FALLBACK: Self = Self {
        x: 0.4,
        y: 0.4,
        width: 0.2,
        height: 0.2,
    };

    /// Fraction of the frame covered by the box.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Box center as `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Point at fractional offsets `(fx, fy)` inside the box.
    #[must_use]
    pub fn point_at(&self, fx: f32, fy: f32) -> Point {
        Point {
            x: self.x + self.width * fx,
            y: self.y + self.height * fy,
        }
    }

    /// Clamps the box into the unit square.
    #[must_use]
    pub fn clamped(self) -> Self {
        let x = clamp_unit(self.x);
        let y = clamp_unit(self.y);
        Self {
            x,
            y,
            width: clamp_unit(self.width).min(1.0 - x),
            height: clamp_unit(self.height).min(1.0 - y),
        }
    }

    /// True when the box has a positive extent on both axes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Normalized 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position, `[0,1]`.
    pub x: f32,
    /// Vertical position, `[0,1]`.
    pub y: f32,
}

/// Named facial landmarks.
///
/// Heuristic providers place these at fixed offsets inside the bounding box;
/// they are an approximation, not a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    /// Left eye.
    pub left_eye: Point,
    /// Right eye.
    pub right_eye: Point,
    /// Nose tip.
    pub nose: Point,
    /// Mouth center.
    pub mouth: Point,
}

impl Landmarks {
    /// Derives landmarks from a bounding box.
    #[must_use]
    pub fn from_box(bbox: &BoundingBox) -> Self {
        Self {
            left_eye: bbox.point_at(0.3, 0.4),
            right_eye: bbox.point_at(0.7, 0.4),
            nose: bbox.point_at(0.5, 0.6),
            mouth: bbox.point_at(0.5, 0.8),
        }
    }

    fn clamped(self) -> Self {
        let clamp = |p: Point| Point {
            x: clamp_unit(p.x),
            y: clamp_unit(p.y),
        };
        Self {
            left_eye: clamp(self.left_eye),
            right_eye: clamp(self.right_eye),
            nose: clamp(self.nose),
            mouth: clamp(self.mouth),
        }
    }
}

/// Head orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    /// Rotation around the vertical axis.
    pub yaw: f32,
    /// Rotation around the lateral axis.
    pub pitch: f32,
    /// Rotation around the viewing axis.
    pub roll: f32,
}

/// Per-face attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceAttributes {
    /// Whether both eyes are open.
    pub eyes_open: bool,
    /// Head orientation.
    pub head_pose: HeadPose,
    /// Confidence of the emotion estimate, `[0,1]`.
    pub emotion_confidence: f32,
}

/// Photometric estimates a remote service may attach to its answer.
///
/// Informational only; scoring always uses locally computed statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityScores {
    /// Brightness, `[0,100]`.
    pub brightness: f32,
    /// Contrast, `[0,100]`.
    pub contrast: f32,
    /// Sharpness, `[0,100]`.
    pub sharpness: f32,
}

/// Output of a detection provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Whether a face was found.
    pub face_detected: bool,
    /// Detection confidence, `[0,1]`.
    pub confidence: f32,
    /// Face location; [`BoundingBox::FALLBACK`] when nothing was detected.
    pub bounding_box: BoundingBox,
    /// Landmarks derived from the bounding box.
    pub landmarks: Landmarks,
    /// Face attributes.
    #[serde(default)]
    pub attributes: FaceAttributes,
    /// Optional remote photometric estimates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_scores: Option<QualityScores>,
}

impl DetectionResult {
    /// The explicit "nothing found" result, also used when a provider fails.
    #[must_use]
    pub fn not_detected() -> Self {
        Self::fallback(0.0)
    }

    /// A not-detected result carrying a residual confidence.
    #[must_use]
    pub fn fallback(confidence: f32) -> Self {
        Self {
            face_detected: false,
            confidence: clamp_unit(confidence),
            bounding_box: BoundingBox::FALLBACK,
            landmarks: Landmarks::from_box(&BoundingBox::FALLBACK),
            attributes: FaceAttributes::default(),
            quality_scores: None,
        }
    }

    /// Enforces the result invariants on data from an untrusted source.
    ///
    /// Clamps confidence and coordinates, demotes a "detected" face with an
    /// empty box to not-detected, and pins the fallback box on every
    /// not-detected result.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.confidence = clamp_unit(self.confidence);
        self.attributes.emotion_confidence = clamp_unit(self.attributes.emotion_confidence);
        self.bounding_box = self.bounding_box.clamped();

        if self.face_detected && !self.bounding_box.is_valid() {
            self.face_detected = false;
        }
        if self.face_detected {
            self.landmarks = self.landmarks.clamped();
        } else {
            self.bounding_box = BoundingBox::FALLBACK;
            self.landmarks = Landmarks::from_box(&BoundingBox::FALLBACK);
        }
        self
    }
}

/// Clamps to `[0,1]`, mapping NaN to 0.
#[inline]
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
