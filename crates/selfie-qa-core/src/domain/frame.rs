//! Frame buffers sampled from a frame source.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::AnalysisFailure;

/// Channel layout of a frame's pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    /// Three bytes per pixel: R, G, B.
    Rgb8,
    /// Four bytes per pixel: R, G, B, A. Alpha is ignored by analysis.
    Rgba8,
}

impl PixelLayout {
    /// Number of bytes per pixel.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// A single sampled frame.
///
/// Frames are ephemeral: a scheduler tick samples one, analyzes it and drops it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel bytes, row-major, no padding.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel layout of `pixels`.
    pub layout: PixelLayout,
    /// When the frame was sampled.
    pub captured_at: OffsetDateTime,
}

impl Frame {
    /// Creates a frame from raw bytes, stamped with the current time.
    ///
    /// The buffer is not validated here; see [`Frame::validate`].
    #[must_use]
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            pixels,
            width,
            height,
            layout,
            captured_at: OffsetDateTime::now_utc(),
        }
    }

    /// Creates an RGB frame from an `image` buffer.
    #[must_use]
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, PixelLayout::Rgb8)
    }

    /// Creates a frame from any decoded image, converting to RGB8.
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgb_image(image.to_rgb8())
    }

    /// Returns the same pixels stamped with the current time.
    #[must_use]
    pub fn restamped(mut self) -> Self {
        self.captured_at = OffsetDateTime::now_utc();
        self
    }

    /// Number of pixels the dimensions describe.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Checks that the buffer is non-empty and matches the dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisFailure::EmptyFrame`] for zero dimensions or an empty
    /// buffer, and [`AnalysisFailure::BufferSizeMismatch`] when the buffer is
    /// shorter than `width * height * channels`.
    pub fn validate(&self) -> Result<(), AnalysisFailure> {
        if self.width == 0 || self.height == 0 || self.pixels.is_empty() {
            return Err(AnalysisFailure::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.pixel_count() * self.layout.channels();
        if self.pixels.len() < expected {
            return Err(AnalysisFailure::BufferSizeMismatch {
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    /// Returns the RGB triple at `(x, y)`.
    ///
    /// Callers must stay within bounds of a validated frame.
    #[inline]
    #[must_use]
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let channels = self.layout.channels();
        let offset = (y as usize * self.width as usize + x as usize) * channels;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ]
    }

    /// Luma of the pixel at `(x, y)` on a 0-255 scale.
    #[inline]
    #[must_use]
    pub fn luma(&self, x: u32, y: u32) -> f64 {
        let [r, g, b] = self.rgb(x, y);
        luma(r, g, b)
    }

    /// Converts the frame into an RGB image, dropping any alpha channel.
    ///
    /// # Errors
    ///
    /// Returns the validation failure when the buffer is malformed.
    pub fn to_rgb_image(&self) -> Result<RgbImage, AnalysisFailure> {
        self.validate()?;
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for chunk in self
            .pixels
            .chunks_exact(self.layout.channels())
            .take(self.pixel_count())
        {
            rgb.extend_from_slice(&chunk[..3]);
        }
        RgbImage::from_raw(self.width, self.height, rgb).ok_or(AnalysisFailure::BufferSizeMismatch {
            expected: self.pixel_count() * 3,
            actual: self.pixels.len(),
        })
    }

    /// Encodes the frame into a portable image format.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is malformed or the encoder rejects it.
    pub fn encode(&self, format: StillFormat) -> anyhow::Result<EncodedImage> {
        let rgb = self.to_rgb_image()?;
        let mut bytes = Vec::new();
        match format {
            StillFormat::Png => {
                DynamicImage::ImageRgb8(rgb)
                    .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
            }
            StillFormat::Jpeg { quality } => {
                let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
                encoder.encode_image(&rgb)?;
            }
        }
        Ok(EncodedImage {
            bytes,
            format,
            width: self.width,
            height: self.height,
        })
    }
}

/// Perceptual luma from 8-bit RGB (ITU-R BT.601 weights).
#[inline]
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}

/// Portable formats a still can be encoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "format")]
pub enum StillFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Baseline JPEG at the given quality (1-100).
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
}

impl StillFormat {
    /// MIME type of the encoded bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

/// An encoded still image.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Format of `bytes`.
    pub format: StillFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let frame = Frame::new(vec![], 0, 10, PixelLayout::Rgb8);
        assert!(matches!(
            frame.validate(),
            Err(AnalysisFailure::EmptyFrame { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_validate_rejects_short_buffer() {
        let frame = Frame::new(vec![0; 10], 2, 2, PixelLayout::Rgba8);
        assert!(matches!(
            frame.validate(),
            Err(AnalysisFailure::BufferSizeMismatch {
                expected: 16,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_rgba_pixel_access_skips_alpha() {
        let frame = Frame::new(
            vec![1, 2, 3, 255, 10, 20, 30, 0],
            2,
            1,
            PixelLayout::Rgba8,
        );
        assert_eq!(frame.rgb(0, 0), [1, 2, 3]);
        assert_eq!(frame.rgb(1, 0), [10, 20, 30]);
    }

    #[test]
    fn test_luma_weights() {
        assert!((luma(255, 255, 255) - 255.0).abs() < 1e-9);
        assert!(luma(0, 0, 0).abs() < 1e-9);
        assert!((luma(255, 0, 0) - 76.245).abs() < 1e-9);
    }

    #[test]
    fn test_encode_png_roundtrips_dimensions() {
        let frame = Frame::from_rgb_image(RgbImage::from_pixel(8, 6, image::Rgb([200, 120, 90])));
        let encoded = frame.encode(StillFormat::Png).expect("png encode");
        assert_eq!(encoded.format.mime_type(), "image/png");

        let decoded = image::load_from_memory(&encoded.bytes).expect("decode");
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 6);
    }

    #[test]
    fn test_encode_rgba_as_jpeg() {
        let frame = Frame::new(vec![128; 4 * 4 * 4], 4, 4, PixelLayout::Rgba8);
        let encoded = frame
            .encode(StillFormat::Jpeg { quality: 85 })
            .expect("jpeg encode");
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_empty_frame_fails() {
        let frame = Frame::new(vec![], 0, 0, PixelLayout::Rgb8);
        assert!(frame.encode(StillFormat::Png).is_err());
    }
}
