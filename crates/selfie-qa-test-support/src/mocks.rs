//! Mock implementations of core port traits.
//!
//! Every mock is cheap to clone and clones share their recorded state, so a
//! test can keep one handle while the session owns another.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use selfie_qa_core::domain::{DetectionResult, DeviceError, EncodedImage, Frame};
use selfie_qa_core::ports::{
    ConfirmationSink, DetectionProvider, FrameSource, LiveEvent, LiveEventSink,
};
use tokio::sync::Notify;

fn locked<T: Clone>(m: &Mutex<T>) -> T {
    m.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

#[derive(Debug, Default)]
struct SourceLog {
    starts: usize,
    stops: usize,
    samples: usize,
    started: bool,
}

/// Mock implementation of `FrameSource` for testing.
///
/// Yields pre-built frames in a loop and tracks lifecycle calls.
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    frames: Arc<Vec<Frame>>,
    start_error: Option<DeviceError>,
    log: Arc<Mutex<SourceLog>>,
}

impl MockFrameSource {
    /// Creates a mock source cycling through `frames`.
    #[must_use]
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: Arc::new(frames),
            start_error: None,
            log: Arc::new(Mutex::new(SourceLog::default())),
        }
    }

    /// Creates a mock source whose `start` always fails with `error`.
    #[must_use]
    pub fn failing(error: DeviceError) -> Self {
        Self {
            start_error: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// Number of `start` calls.
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).starts
    }

    /// Number of `stop` calls.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).stops
    }

    /// Number of successful samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).samples
    }

    /// Whether the device is currently held.
    #[must_use]
    pub fn started(&self) -> bool {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).started
    }
}

impl FrameSource for MockFrameSource {
    fn start(&mut self) -> Result<(), DeviceError> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.starts += 1;
        if let Some(error) = &self.start_error {
            return Err(error.clone());
        }
        log.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.stops += 1;
        log.started = false;
    }

    fn sample(&mut self) -> Result<Frame, DeviceError> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if !log.started {
            return Err(DeviceError::NotStarted);
        }
        if self.frames.is_empty() {
            return Err(DeviceError::SampleFailed("mock has no frames".into()));
        }
        let frame = self.frames[log.samples % self.frames.len()].clone();
        log.samples += 1;
        Ok(frame)
    }

    fn is_started(&self) -> bool {
        self.started()
    }
}

#[derive(Debug, Default)]
struct Concurrency {
    calls: AtomicUsize,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
}

/// Decrements the outstanding count even when the call is cancelled.
struct CallGuard<'a>(&'a Concurrency);

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.0.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock implementation of `DetectionProvider` for testing.
///
/// Returns a fixed result after an optional delay, optionally waiting for a
/// release signal, and records call concurrency.
#[derive(Debug, Clone)]
pub struct MockDetectionProvider {
    result: Arc<Mutex<DetectionResult>>,
    delay: Duration,
    gate: Option<Arc<Notify>>,
    stats: Arc<Concurrency>,
}

impl MockDetectionProvider {
    /// Creates a provider answering `result` immediately.
    #[must_use]
    pub fn new(result: DetectionResult) -> Self {
        Self {
            result: Arc::new(Mutex::new(result)),
            delay: Duration::ZERO,
            gate: None,
            stats: Arc::new(Concurrency::default()),
        }
    }

    /// Adds a delay before every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes every call wait for [`Self::release`] before answering.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Lets one gated call proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Replaces the answer for later calls.
    pub fn set_result(&self, result: DetectionResult) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = result;
    }

    /// Number of calls started.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.stats.calls.load(Ordering::SeqCst)
    }

    /// Calls started but not yet finished or cancelled.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.stats.outstanding.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls observed.
    #[must_use]
    pub fn max_outstanding(&self) -> usize {
        self.stats.max_outstanding.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DetectionProvider for MockDetectionProvider {
    async fn analyze(&self, _frame: &Frame) -> DetectionResult {
        self.stats.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_outstanding.fetch_max(now, Ordering::SeqCst);
        let _guard = CallGuard(&self.stats);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        locked(&self.result)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Mock implementation of `ConfirmationSink` for testing.
///
/// Captures accepted stills for later assertions.
#[derive(Debug, Clone, Default)]
pub struct MockConfirmationSink {
    images: Arc<Mutex<Vec<EncodedImage>>>,
    fail: bool,
}

impl MockConfirmationSink {
    /// Creates a new accepting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects everything.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Returns all accepted stills.
    #[must_use]
    pub fn images(&self) -> Vec<EncodedImage> {
        locked(&self.images)
    }
}

impl ConfirmationSink for MockConfirmationSink {
    fn accept(&self, image: &EncodedImage) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("mock sink rejected the still");
        }
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image.clone());
        Ok(())
    }
}

/// Mock implementation of `LiveEventSink` for testing.
///
/// Captures events for later assertions.
#[derive(Debug, Clone, Default)]
pub struct MockEventSink {
    events: Arc<Mutex<Vec<LiveEvent>>>,
}

impl MockEventSink {
    /// Creates a new mock event sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<LiveEvent> {
        locked(&self.events)
    }

    /// Returns the number of `TickCommitted` events.
    #[must_use]
    pub fn committed_count(&self) -> usize {
        self.count(|e| matches!(e, LiveEvent::TickCommitted { .. }))
    }

    /// Returns the number of `TickSkipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|e| matches!(e, LiveEvent::TickSkipped { .. }))
    }

    /// Returns the number of `AnalysisFailed` events.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|e| matches!(e, LiveEvent::AnalysisFailed { .. }))
    }

    /// Returns the number of `LateResultDiscarded` events.
    #[must_use]
    pub fn discarded_count(&self) -> usize {
        self.count(|e| matches!(e, LiveEvent::LateResultDiscarded { .. }))
    }

    /// Returns the overall scores of committed ticks, in order.
    #[must_use]
    pub fn committed_scores(&self) -> Vec<u8> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                LiveEvent::TickCommitted { assessment, .. } => Some(assessment.overall_score),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&LiveEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl LiveEventSink for MockEventSink {
    fn on_event(&self, event: LiveEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::SyntheticFrameBuilder;

    #[test]
    fn test_mock_source_requires_start() {
        let mut source = MockFrameSource::new(vec![SyntheticFrameBuilder::dark(4, 4)]);
        assert_eq!(source.sample().err(), Some(DeviceError::NotStarted));
        source.start().unwrap();
        assert!(source.sample().is_ok());
        assert_eq!(source.sample_count(), 1);
    }

    #[test]
    fn test_mock_source_clones_share_log() {
        let source = MockFrameSource::new(vec![SyntheticFrameBuilder::dark(4, 4)]);
        let mut owned = source.clone();
        owned.start().unwrap();
        owned.stop();
        assert_eq!(source.start_count(), 1);
        assert_eq!(source.stop_count(), 1);
        assert!(!source.started());
    }

    #[test]
    fn test_failing_source() {
        let mut source = MockFrameSource::failing(DeviceError::PermissionDenied("test".into()));
        assert!(matches!(
            source.start(),
            Err(DeviceError::PermissionDenied(_))
        ));
        assert!(!source.is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_provider_tracks_calls() {
        let provider = MockDetectionProvider::new(DetectionResult::not_detected())
            .with_delay(Duration::from_millis(100));
        let frame = SyntheticFrameBuilder::dark(4, 4);
        let result = provider.analyze(&frame).await;
        assert!(!result.face_detected);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.outstanding(), 0);
        assert_eq!(provider.max_outstanding(), 1);
    }

    #[test]
    fn test_mock_confirmation_sink() {
        let sink = MockConfirmationSink::new();
        let image = SyntheticFrameBuilder::dark(4, 4)
            .encode(selfie_qa_core::StillFormat::Png)
            .unwrap();
        sink.accept(&image).unwrap();
        assert_eq!(sink.images().len(), 1);
        assert!(MockConfirmationSink::failing().accept(&image).is_err());
    }
}
