//! Quality scoring rubric.
//!
//! Combines photometric statistics and a detection result into a
//! [`QualityAssessment`]. The rubric is evaluated in a fixed order and every
//! failed criterion contributes exactly one issue and one recommendation, so
//! the issue list reads in the same order as the table below.
//!
//! | Criterion       | Points | Pass condition                                   |
//! |-----------------|--------|--------------------------------------------------|
//! | Lighting        | 20     | brightness in `[30, 85]`                         |
//! | Sharpness       | 20     | sharpness `>= 40`                                |
//! | Face confidence | 25     | `> 0.8` gives 25, `> 0.5` gives 15               |
//! | Face size       | 15     | box area in `[0.08, 0.25]`                       |
//! | Head pose       | 10     | `|yaw| < 15`, `|pitch| < 15`, `|roll| < 10`      |
//! | Eyes open       | 5      | eyes open                                        |
//! | Centering       | 5      | box center within 0.15 of the frame center       |
//!
//! The five face criteria award nothing unless a face was detected.

use crate::domain::{Award, Criterion, DetectionResult, PhotometricStats, QualityAssessment};

/// Rubric thresholds.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Inclusive brightness band.
    pub brightness_range: (f32, f32),
    /// Minimum sharpness.
    pub min_sharpness: f32,
    /// Confidence strictly above which the full confidence award is given.
    pub high_confidence: f32,
    /// Confidence strictly above which the partial award is given.
    pub medium_confidence: f32,
    /// Inclusive face area band, as a fraction of the frame.
    pub face_area_range: (f32, f32),
    /// Exclusive bound on `|yaw|`.
    pub max_yaw: f32,
    /// Exclusive bound on `|pitch|`.
    pub max_pitch: f32,
    /// Exclusive bound on `|roll|`.
    pub max_roll: f32,
    /// Inclusive bound on center offset per axis.
    pub max_center_offset: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            brightness_range: (30.0, 85.0),
            min_sharpness: 40.0,
            high_confidence: 0.8,
            medium_confidence: 0.5,
            face_area_range: (0.08, 0.25),
            max_yaw: 15.0,
            max_pitch: 15.0,
            max_roll: 10.0,
            max_center_offset: 0.15,
        }
    }
}

/// Points for the partially satisfied confidence criterion.
const PARTIAL_CONFIDENCE_POINTS: u8 = 15;

/// A failed criterion with its user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finding {
    TooDark,
    TooBright,
    Blurry,
    NoFace,
    LowConfidence,
    FaceTooSmall,
    FaceTooClose,
    HeadTurned,
    EyesClosed,
    OffCenter,
}

impl Finding {
    const fn issue(self) -> &'static str {
        match self {
            Self::TooDark => "Too dark",
            Self::TooBright => "Too bright",
            Self::Blurry => "Image is blurry",
            Self::NoFace => "No face detected",
            Self::LowConfidence => "Face not clearly visible",
            Self::FaceTooSmall => "Face too small",
            Self::FaceTooClose => "Face too close",
            Self::HeadTurned => "Head not facing forward",
            Self::EyesClosed => "Eyes not clearly open",
            Self::OffCenter => "Face not centered",
        }
    }

    const fn recommendation(self) -> &'static str {
        match self {
            Self::TooDark => "Move to a brighter area or add light facing you",
            Self::TooBright => "Reduce direct light or move away from bright backgrounds",
            Self::Blurry => "Hold the camera steady and make sure the lens is clean",
            Self::NoFace => "Position your face in the center of the frame",
            Self::LowConfidence => "Face the camera directly with your full face in view",
            Self::FaceTooSmall => "Move closer to the camera",
            Self::FaceTooClose => "Move slightly away from the camera",
            Self::HeadTurned => "Look straight at the camera and keep your head level",
            Self::EyesClosed => "Keep your eyes open and look at the camera",
            Self::OffCenter => "Center your face in the frame",
        }
    }
}

/// Pure rubric scorer.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    /// Creates a scorer with the given thresholds.
    #[must_use]
    pub const fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Returns the scorer thresholds.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores one frame.
    #[must_use]
    pub fn score(&self, stats: &PhotometricStats, detection: &DetectionResult) -> QualityAssessment {
        let evaluations = [
            (Criterion::Lighting, self.lighting(stats)),
            (Criterion::Sharpness, self.sharpness(stats)),
            (Criterion::FaceConfidence, self.face_confidence(detection)),
            (Criterion::FaceSize, self.face_size(detection)),
            (Criterion::HeadPose, self.head_pose(detection)),
            (Criterion::EyesOpen, Self::eyes_open(detection)),
            (Criterion::Centering, self.centering(detection)),
        ];

        let mut breakdown = Vec::with_capacity(evaluations.len());
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let mut overall_score = 0u8;

        for (criterion, (points, finding)) in evaluations {
            overall_score += points;
            breakdown.push(Award {
                criterion,
                points,
                max_points: criterion.max_points(),
            });
            if let Some(finding) = finding {
                issues.push(finding.issue().to_owned());
                recommendations.push(finding.recommendation().to_owned());
            }
        }

        QualityAssessment {
            brightness: stats.brightness,
            contrast: stats.contrast,
            sharpness: stats.sharpness,
            face_detected: detection.face_detected,
            face_confidence: detection.confidence,
            face_size: detection.bounding_box.area(),
            bounding_box: detection.bounding_box,
            head_pose: detection.attributes.head_pose,
            eyes_open: detection.attributes.eyes_open,
            overall_score,
            issues,
            recommendations,
            breakdown,
        }
    }

    fn lighting(&self, stats: &PhotometricStats) -> (u8, Option<Finding>) {
        let (low, high) = self.config.brightness_range;
        if (low..=high).contains(&stats.brightness) {
            (Criterion::Lighting.max_points(), None)
        } else if stats.brightness > high {
            (0, Some(Finding::TooBright))
        } else {
            (0, Some(Finding::TooDark))
        }
    }

    fn sharpness(&self, stats: &PhotometricStats) -> (u8, Option<Finding>) {
        if stats.sharpness >= self.config.min_sharpness {
            (Criterion::Sharpness.max_points(), None)
        } else {
            (0, Some(Finding::Blurry))
        }
    }

    fn face_confidence(&self, detection: &DetectionResult) -> (u8, Option<Finding>) {
        if !detection.face_detected {
            return (0, Some(Finding::NoFace));
        }
        if detection.confidence > self.config.high_confidence {
            (Criterion::FaceConfidence.max_points(), None)
        } else if detection.confidence > self.config.medium_confidence {
            (PARTIAL_CONFIDENCE_POINTS, Some(Finding::LowConfidence))
        } else {
            (0, Some(Finding::LowConfidence))
        }
    }

    fn face_size(&self, detection: &DetectionResult) -> (u8, Option<Finding>) {
        if !detection.face_detected {
            return (0, Some(Finding::FaceTooSmall));
        }
        let (low, high) = self.config.face_area_range;
        let area = detection.bounding_box.area();
        if area < low {
            (0, Some(Finding::FaceTooSmall))
        } else if area > high {
            (0, Some(Finding::FaceTooClose))
        } else {
            (Criterion::FaceSize.max_points(), None)
        }
    }

    fn head_pose(&self, detection: &DetectionResult) -> (u8, Option<Finding>) {
        let pose = detection.attributes.head_pose;
        let level = pose.yaw.abs() < self.config.max_yaw
            && pose.pitch.abs() < self.config.max_pitch
            && pose.roll.abs() < self.config.max_roll;
        if detection.face_detected && level {
            (Criterion::HeadPose.max_points(), None)
        } else {
            (0, Some(Finding::HeadTurned))
        }
    }

    fn eyes_open(detection: &DetectionResult) -> (u8, Option<Finding>) {
        if detection.face_detected && detection.attributes.eyes_open {
            (Criterion::EyesOpen.max_points(), None)
        } else {
            (0, Some(Finding::EyesClosed))
        }
    }

    fn centering(&self, detection: &DetectionResult) -> (u8, Option<Finding>) {
        let (cx, cy) = detection.bounding_box.center();
        let limit = self.config.max_center_offset;
        let centered = (cx - 0.5).abs() <= limit && (cy - 0.5).abs() <= limit;
        if detection.face_detected && centered {
            (Criterion::Centering.max_points(), None)
        } else {
            (0, Some(Finding::OffCenter))
        }
    }
}
