//! Heuristic face region estimation.
//!
//! Scans a square window around the frame center for skin-toned pixels and
//! derives a face box from their extent. This is a color heuristic, not a
//! face detector: anything skin-colored in the middle of the frame counts.
//!
//! Skin rule (per sampled RGB pixel):
//!
//! ```text
//! R > 95 && G > 40 && B > 20 && R > G && R > B
//!     && |R - G| > 15 && max(R,G,B) - min(R,G,B) > 15
//! ```

#![allow(clippy::cast_precision_loss)]

use tracing::debug;

use crate::domain::{clamp_unit, BoundingBox, DetectionResult, FaceAttributes, Frame, Landmarks};

/// Configuration for the face region heuristic.
#[derive(Debug, Clone)]
pub struct FaceRegionConfig {
    /// Window radius is `min(width, height) / window_divisor`.
    pub window_divisor: u32,
    /// Grid step, in pixels, between sampled pixels on both axes.
    pub sample_step: u32,
    /// Skin ratio above which a face is reported.
    pub min_skin_ratio: f32,
}

impl Default for FaceRegionConfig {
    fn default() -> Self {
        Self {
            window_divisor: 3,
            sample_step: 3,
            min_skin_ratio: 0.15,
        }
    }
}

/// Estimated face region, without attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    /// Whether enough skin was found.
    pub detected: bool,
    /// Presence confidence, `[0,1]`.
    pub confidence: f32,
    /// Fraction of sampled window pixels classified as skin.
    pub skin_ratio: f32,
    /// Skin extent, or the fallback box.
    pub bounding_box: BoundingBox,
    /// Fixed-offset landmarks inside `bounding_box`.
    pub landmarks: Landmarks,
}

impl FaceRegion {
    fn not_found(skin_ratio: f32) -> Self {
        Self {
            detected: false,
            confidence: clamp_unit(skin_ratio),
            skin_ratio,
            bounding_box: BoundingBox::FALLBACK,
            landmarks: Landmarks::from_box(&BoundingBox::FALLBACK),
        }
    }

    /// Converts to a detection result with default (unknown) attributes.
    #[must_use]
    pub fn into_detection(self) -> DetectionResult {
        if !self.detected {
            return DetectionResult::fallback(self.confidence);
        }
        DetectionResult {
            face_detected: true,
            confidence: self.confidence,
            bounding_box: self.bounding_box,
            landmarks: self.landmarks,
            attributes: FaceAttributes::default(),
            quality_scores: None,
        }
    }
}

/// Color-based face region estimator.
#[derive(Debug, Clone, Default)]
pub struct FaceRegionEstimator {
    config: FaceRegionConfig,
}

impl FaceRegionEstimator {
    /// Creates an estimator with the given configuration.
    #[must_use]
    pub const fn new(config: FaceRegionConfig) -> Self {
        Self { config }
    }

    /// Returns the estimator configuration.
    #[must_use]
    pub const fn config(&self) -> &FaceRegionConfig {
        &self.config
    }

    /// Estimates the face region of a frame.
    ///
    /// Malformed frames report no face.
    #[must_use]
    pub fn estimate(&self, frame: &Frame) -> FaceRegion {
        if frame.validate().is_err() {
            return FaceRegion::not_found(0.0);
        }

        let step = self.config.sample_step.max(1);
        let radius = frame.width.min(frame.height) / self.config.window_divisor.max(1);
        let (cx, cy) = (frame.width / 2, frame.height / 2);
        let x_range = cx.saturating_sub(radius)..(cx + radius).min(frame.width);
        let y_range = cy.saturating_sub(radius)..(cy + radius).min(frame.height);

        let mut sampled = 0u32;
        let mut skin = 0u32;
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);

        for y in y_range.step_by(step as usize) {
            for x in x_range.clone().step_by(step as usize) {
                sampled += 1;
                let [r, g, b] = frame.rgb(x, y);
                if is_skin(r, g, b) {
                    skin += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        if sampled == 0 {
            return FaceRegion::not_found(0.0);
        }

        let skin_ratio = skin as f32 / sampled as f32;
        let detected = skin_ratio > self.config.min_skin_ratio;
        debug!(
            "Face heuristic: {skin}/{sampled} skin samples (ratio {skin_ratio:.3}), detected={detected}"
        );

        if !detected {
            return FaceRegion::not_found(skin_ratio);
        }

        // A lone sample column or row still spans one sampling step.
        let width_px = (max_x - min_x + step).min(frame.width - min_x);
        let height_px = (max_y - min_y + step).min(frame.height - min_y);
        let bounding_box = BoundingBox {
            x: min_x as f32 / frame.width as f32,
            y: min_y as f32 / frame.height as f32,
            width: width_px as f32 / frame.width as f32,
            height: height_px as f32 / frame.height as f32,
        }
        .clamped();

        FaceRegion {
            detected,
            confidence: clamp_unit(0.6 + 0.4 * skin_ratio),
            skin_ratio,
            bounding_box,
            landmarks: Landmarks::from_box(&bounding_box),
        }
    }
}

/// Fixed channel-relationship skin classifier.
#[must_use]
pub fn is_skin(r: u8, g: u8, b: u8) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    r > 95 && g > 40 && b > 20 && r > g && r > b && r.abs_diff(g) > 15 && max - min > 15
}
