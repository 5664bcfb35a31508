//! Photometric frame analysis.
//!
//! Computes brightness, contrast and a sparse sharpness estimate from the luma
//! of a frame. Brightness and contrast visit every pixel; sharpness samples a
//! sparse grid so the analysis stays cheap at the live cadence.

// Statistics over u32-indexed pixel grids
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use tracing::{debug, warn};

use crate::domain::{AnalysisFailure, Frame, PhotometricStats};

/// Configuration for photometric analysis.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Grid step, in pixels, between sharpness samples on both axes.
    pub sample_step: u32,
    /// Multiplier applied to the mean edge energy before clamping to 100.
    pub sharpness_scale: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_step: 20,
            sharpness_scale: 2.0,
        }
    }
}

/// Result of analyzing one frame.
///
/// A degenerate frame still produces stats (all zero) so callers never have
/// to handle an error; the failure is recorded alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotometricAnalysis {
    /// Computed statistics.
    pub stats: PhotometricStats,
    /// Why the stats are zero, if the frame was malformed.
    pub failure: Option<AnalysisFailure>,
}

impl PhotometricAnalysis {
    /// True when the frame was analyzed without failure.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// Frame analyzer computing [`PhotometricStats`].
#[derive(Debug, Clone, Default)]
pub struct FrameAnalyzer {
    config: AnalyzerConfig,
}

impl FrameAnalyzer {
    /// Creates an analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Returns the analyzer configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes a frame.
    #[must_use]
    pub fn analyze(&self, frame: &Frame) -> PhotometricAnalysis {
        if let Err(failure) = frame.validate() {
            warn!("Photometric analysis skipped: {failure}");
            return PhotometricAnalysis {
                stats: PhotometricStats::default(),
                failure: Some(failure),
            };
        }

        let (brightness, contrast) = luma_summary(frame);
        let sharpness = self.sharpness(frame);

        let stats = PhotometricStats {
            brightness: to_percent(brightness / 255.0 * 100.0),
            contrast: to_percent(contrast),
            sharpness: to_percent(sharpness),
        };
        debug!(
            "Photometric stats: brightness={:.1} contrast={:.1} sharpness={:.1}",
            stats.brightness, stats.contrast, stats.sharpness
        );

        PhotometricAnalysis {
            stats,
            failure: None,
        }
    }

    /// Sparse edge energy: horizontal plus vertical luma deltas on a grid.
    fn sharpness(&self, frame: &Frame) -> f64 {
        let step = self.config.sample_step.max(1) as usize;
        // Need a right and a lower neighbour for every sample.
        if frame.width < 2 || frame.height < 2 {
            return 0.0;
        }

        let mut edge_sum = 0.0;
        let mut samples = 0u64;
        for y in (0..frame.height - 1).step_by(step) {
            for x in (0..frame.width - 1).step_by(step) {
                let center = frame.luma(x, y);
                edge_sum += (center - frame.luma(x + 1, y)).abs();
                edge_sum += (center - frame.luma(x, y + 1)).abs();
                samples += 1;
            }
        }

        if samples == 0 {
            return 0.0;
        }
        edge_sum / samples as f64 * self.config.sharpness_scale
    }
}

/// Mean luma and luma range (as a percentage of full scale) over all pixels.
fn luma_summary(frame: &Frame) -> (f64, f64) {
    let mut sum = 0.0;
    let mut min = f64::MAX;
    let mut max = f64::MIN;

    for y in 0..frame.height {
        for x in 0..frame.width {
            let l = frame.luma(x, y);
            sum += l;
            min = min.min(l);
            max = max.max(l);
        }
    }

    let mean = sum / frame.pixel_count() as f64;
    let range = (max - min) / 255.0 * 100.0;
    (mean, range)
}

/// Clamps to `[0,100]`, mapping NaN to 0.
fn to_percent(value: f64) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        (value as f32).clamp(0.0, 100.0)
    }
}
