//! Local heuristic detection provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::attributes::{AttributeSource, StochasticAttributes};
use crate::domain::{DetectionResult, Frame};
use crate::modules::FaceRegionEstimator;
use crate::ports::DetectionProvider;

/// Detection provider built from the skin-color face region estimate.
///
/// Attributes are filled from an [`AttributeSource`] for detected faces only;
/// a not-detected result keeps default attributes.
#[derive(Clone)]
pub struct HeuristicProvider {
    estimator: FaceRegionEstimator,
    attributes: Arc<dyn AttributeSource>,
}

impl HeuristicProvider {
    /// Creates a provider from an estimator and an attribute source.
    #[must_use]
    pub fn new(estimator: FaceRegionEstimator, attributes: Arc<dyn AttributeSource>) -> Self {
        Self {
            estimator,
            attributes,
        }
    }

    /// Runs the estimate synchronously.
    #[must_use]
    pub fn detect(&self, frame: &Frame) -> DetectionResult {
        let region = self.estimator.estimate(frame);
        let mut detection = region.into_detection();
        if detection.face_detected {
            detection.attributes = self.attributes.next_attributes();
        }
        debug!(
            "Heuristic detection: detected={} confidence={:.2} skin_ratio={:.3}",
            detection.face_detected, detection.confidence, region.skin_ratio
        );
        detection
    }
}

impl Default for HeuristicProvider {
    fn default() -> Self {
        Self::new(
            FaceRegionEstimator::default(),
            Arc::new(StochasticAttributes::default()),
        )
    }
}

impl std::fmt::Debug for HeuristicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicProvider")
            .field("estimator", &self.estimator)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DetectionProvider for HeuristicProvider {
    async fn analyze(&self, frame: &Frame) -> DetectionResult {
        self.detect(frame)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
