//! Face attribute sources.
//!
//! Nothing in this crate measures eyes, head pose or emotion. Until a real
//! model is wired in behind [`DetectionProvider`](crate::ports::DetectionProvider),
//! attributes come from an [`AttributeSource`]. The default source draws
//! plausible values at random. Those values are a placeholder that lets the
//! rubric run end to end; they carry no information about the person in
//! front of the camera.

use std::ops::RangeInclusive;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{clamp_unit, FaceAttributes, HeadPose};

/// Supplies attributes for a detected face.
pub trait AttributeSource: Send + Sync {
    /// Produces attributes for the next detected face.
    fn next_attributes(&self) -> FaceAttributes;
}

/// Ranges for [`StochasticAttributes`].
#[derive(Debug, Clone)]
pub struct StochasticAttributesConfig {
    /// Probability that the eyes are reported open.
    pub eyes_open_probability: f64,
    /// Yaw range, degrees.
    pub yaw: RangeInclusive<f32>,
    /// Pitch range, degrees.
    pub pitch: RangeInclusive<f32>,
    /// Roll range, degrees.
    pub roll: RangeInclusive<f32>,
    /// Emotion confidence range.
    pub emotion_confidence: RangeInclusive<f32>,
    /// Fixed seed for reproducible runs; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for StochasticAttributesConfig {
    fn default() -> Self {
        Self {
            eyes_open_probability: 0.9,
            yaw: -10.0..=10.0,
            pitch: -10.0..=10.0,
            roll: -5.0..=5.0,
            emotion_confidence: 0.7..=0.95,
            seed: None,
        }
    }
}

/// Placeholder attribute source drawing values at random.
#[derive(Debug)]
pub struct StochasticAttributes {
    config: StochasticAttributesConfig,
    rng: Mutex<StdRng>,
}

impl StochasticAttributes {
    /// Creates a source with the given ranges.
    #[must_use]
    pub fn new(config: StochasticAttributesConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Returns the source configuration.
    #[must_use]
    pub const fn config(&self) -> &StochasticAttributesConfig {
        &self.config
    }
}

impl Default for StochasticAttributes {
    fn default() -> Self {
        Self::new(StochasticAttributesConfig::default())
    }
}

fn draw(rng: &mut StdRng, range: &RangeInclusive<f32>) -> f32 {
    if range.start() >= range.end() {
        return *range.start();
    }
    rng.gen_range(range.clone())
}

impl AttributeSource for StochasticAttributes {
    fn next_attributes(&self) -> FaceAttributes {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let c = &self.config;
        FaceAttributes {
            eyes_open: rng.gen_bool(c.eyes_open_probability.clamp(0.0, 1.0)),
            head_pose: HeadPose {
                yaw: draw(&mut rng, &c.yaw),
                pitch: draw(&mut rng, &c.pitch),
                roll: draw(&mut rng, &c.roll),
            },
            emotion_confidence: clamp_unit(draw(&mut rng, &c.emotion_confidence)),
        }
    }
}

/// Attribute source returning the same value every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedAttributes(pub FaceAttributes);

impl FixedAttributes {
    /// Eyes open, level head, confident.
    #[must_use]
    pub const fn frontal() -> Self {
        Self(FaceAttributes {
            eyes_open: true,
            head_pose: HeadPose {
                yaw: 0.0,
                pitch: 0.0,
                roll: 0.0,
            },
            emotion_confidence: 0.9,
        })
    }
}

impl Default for FixedAttributes {
    fn default() -> Self {
        Self::frontal()
    }
}

impl AttributeSource for FixedAttributes {
    fn next_attributes(&self) -> FaceAttributes {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> StochasticAttributes {
        StochasticAttributes::new(StochasticAttributesConfig {
            seed: Some(seed),
            ..StochasticAttributesConfig::default()
        })
    }

    #[test]
    fn test_values_stay_within_ranges() {
        let source = seeded(7);
        for _ in 0..500 {
            let a = source.next_attributes();
            assert!((-10.0..=10.0).contains(&a.head_pose.yaw));
            assert!((-10.0..=10.0).contains(&a.head_pose.pitch));
            assert!((-5.0..=5.0).contains(&a.head_pose.roll));
            assert!((0.7..=0.95).contains(&a.emotion_confidence));
        }
    }

    #[test]
    fn test_default_ranges_always_pass_pose_rubric() {
        let source = seeded(11);
        for _ in 0..200 {
            let pose = source.next_attributes().head_pose;
            assert!(pose.yaw.abs() < 15.0 && pose.pitch.abs() < 15.0 && pose.roll.abs() < 10.0);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = seeded(42);
        let b = seeded(42);
        for _ in 0..20 {
            assert_eq!(a.next_attributes(), b.next_attributes());
        }
    }

    #[test]
    fn test_eyes_probability_extremes() {
        let closed = StochasticAttributes::new(StochasticAttributesConfig {
            eyes_open_probability: 0.0,
            seed: Some(1),
            ..StochasticAttributesConfig::default()
        });
        let open = StochasticAttributes::new(StochasticAttributesConfig {
            eyes_open_probability: 1.0,
            seed: Some(1),
            ..StochasticAttributesConfig::default()
        });
        for _ in 0..50 {
            assert!(!closed.next_attributes().eyes_open);
            assert!(open.next_attributes().eyes_open);
        }
    }

    #[test]
    fn test_degenerate_range_returns_start() {
        let source = StochasticAttributes::new(StochasticAttributesConfig {
            yaw: 3.0..=3.0,
            seed: Some(5),
            ..StochasticAttributesConfig::default()
        });
        assert!((source.next_attributes().head_pose.yaw - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fixed_attributes() {
        let fixed = FixedAttributes::frontal();
        assert_eq!(fixed.next_attributes(), fixed.next_attributes());
        assert!(fixed.next_attributes().eyes_open);
    }
}
