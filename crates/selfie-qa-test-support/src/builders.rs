//! Synthetic frame builders for testing.

use std::path::Path;

use anyhow::Context;
use image::{Rgb, RgbImage};
use selfie_qa_core::domain::{Frame, PixelLayout};

/// A skin tone that passes the face heuristic's color rule.
pub const SKIN: Rgb<u8> = Rgb([220, 170, 140]);

/// Builder for creating synthetic test frames.
///
/// Provides convenience methods for generating frames with specific
/// characteristics (lit face, dark room, blurry, malformed, etc.).
pub struct SyntheticFrameBuilder;

impl SyntheticFrameBuilder {
    // === Faces ===

    /// Well-lit, sharp scene with a centered skin patch.
    ///
    /// The patch spans 30% of the width and 40% of the height. With level
    /// attributes this scores 90: everything passes except the partial
    /// confidence award.
    #[must_use]
    pub fn face(width: u32, height: u32) -> Frame {
        Frame::from_rgb_image(Self::face_image(width, height))
    }

    /// The image behind [`Self::face`].
    #[must_use]
    pub fn face_image(width: u32, height: u32) -> RgbImage {
        let x_range = width * 35 / 100..width * 65 / 100;
        let y_range = height * 30 / 100..height * 70 / 100;
        RgbImage::from_fn(width, height, |x, y| {
            if x_range.contains(&x) && y_range.contains(&y) {
                SKIN
            } else {
                fine_texture(x, y)
            }
        })
    }

    /// Sharp, lit scene whose only skin patch sits in the top-left corner,
    /// outside the face search window.
    #[must_use]
    pub fn face_in_corner(width: u32, height: u32) -> Frame {
        Frame::from_rgb_image(RgbImage::from_fn(width, height, |x, y| {
            if x < width / 6 && y < height / 6 {
                SKIN
            } else {
                fine_texture(x, y)
            }
        }))
    }

    // === Photometric extremes ===

    /// Uniform gray (no edges, no contrast, no face).
    #[must_use]
    pub fn uniform(width: u32, height: u32, value: u8) -> Frame {
        Frame::from_rgb_image(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    /// Near-black frame.
    #[must_use]
    pub fn dark(width: u32, height: u32) -> Frame {
        Self::uniform(width, height, 12)
    }

    /// Black and white checkerboard with the given cell size.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell: u32) -> Frame {
        let cell = cell.max(1);
        Frame::from_rgb_image(RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255; 3])
            } else {
                Rgb([0; 3])
            }
        }))
    }

    /// Uniform RGB color.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> Frame {
        Frame::from_rgb_image(RgbImage::from_pixel(width, height, Rgb([r, g, b])))
    }

    // === Malformed ===

    /// Zero-sized frame.
    #[must_use]
    pub fn empty() -> Frame {
        Frame::new(Vec::new(), 0, 0, PixelLayout::Rgb8)
    }

    /// Frame whose buffer is shorter than its dimensions claim.
    #[must_use]
    pub fn truncated(width: u32, height: u32) -> Frame {
        Frame::new(vec![128; 3], width, height, PixelLayout::Rgb8)
    }

    // === Files ===

    /// Writes `image` to `path`; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be encoded or written.
    pub fn save(image: &RgbImage, path: &Path) -> anyhow::Result<()> {
        image
            .save(path)
            .with_context(|| format!("Failed to save {}", path.display()))
    }

    /// Writes the [`Self::face`] image as a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be encoded or written.
    pub fn save_face(width: u32, height: u32, path: &Path) -> anyhow::Result<()> {
        Self::save(&Self::face_image(width, height), path)
    }

    /// Writes a uniform dark image as a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be encoded or written.
    pub fn save_dark(width: u32, height: u32, path: &Path) -> anyhow::Result<()> {
        Self::save(&RgbImage::from_pixel(width, height, Rgb([12; 3])), path)
    }
}

/// One-pixel checker of light and dark gray: mid brightness, full sharpness.
fn fine_texture(x: u32, y: u32) -> Rgb<u8> {
    if (x + y) % 2 == 0 {
        Rgb([200; 3])
    } else {
        Rgb([40; 3])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use selfie_qa_core::domain::{CaptureGate, CaptureGateState};
    use selfie_qa_core::modules::{FaceRegionEstimator, FrameAnalyzer, QualityScorer};
    use selfie_qa_core::providers::{FixedAttributes, HeuristicProvider};

    use super::*;

    fn score(frame: &Frame) -> u8 {
        let provider = HeuristicProvider::new(
            FaceRegionEstimator::default(),
            Arc::new(FixedAttributes::frontal()),
        );
        let stats = FrameAnalyzer::default().analyze(frame).stats;
        QualityScorer::default()
            .score(&stats, &provider.detect(frame))
            .overall_score
    }

    fn gate_for(score: u8) -> CaptureGateState {
        let mut gate = CaptureGate::default();
        gate.observe(score);
        gate.state()
    }

    #[test]
    fn test_face_scores_ninety() {
        assert_eq!(score(&SyntheticFrameBuilder::face(240, 240)), 90);
        assert_eq!(score(&SyntheticFrameBuilder::face(120, 120)), 90);
    }

    #[test]
    fn test_face_in_corner_is_blocked() {
        let s = score(&SyntheticFrameBuilder::face_in_corner(240, 240));
        assert!(s <= 40, "score {s}");
        assert_eq!(gate_for(s), CaptureGateState::Blocked);
    }

    #[test]
    fn test_dark_is_blocked() {
        let s = score(&SyntheticFrameBuilder::dark(64, 64));
        assert_eq!(s, 0);
    }

    #[test]
    fn test_malformed_frames_fail_validation() {
        assert!(SyntheticFrameBuilder::empty().validate().is_err());
        assert!(SyntheticFrameBuilder::truncated(4, 4).validate().is_err());
    }
}
