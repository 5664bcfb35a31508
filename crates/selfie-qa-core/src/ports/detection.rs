//! Detection provider port.

use async_trait::async_trait;

use crate::domain::{DetectionResult, Frame};

/// Port for anything that can locate a face in a frame.
///
/// Implementations never fail: transport, decode or model errors are logged
/// and reported as [`DetectionResult::not_detected`]. Latency is bounded by
/// the caller, not the provider.
#[async_trait]
pub trait DetectionProvider: Send + Sync {
    /// Analyzes one frame.
    async fn analyze(&self, frame: &Frame) -> DetectionResult;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
