//! Capture session lifecycle.
//!
//! ```text
//!   start ──► Live ──capture──► Frozen ──confirm──► Confirmed
//!              ▲                  │
//!              └──────retake──────┘
//! ```
//!
//! `shutdown` (or drop) moves any phase except `Confirmed` to `Closed`.

use std::sync::Arc;

use tracing::{debug, info};

use super::scheduler::{AnalysisLoop, LoopConfig, TickContext};
use super::state::LiveState;
use crate::domain::{
    CaptureGate, CaptureGateState, DeviceError, EncodedImage, Frame, SessionError, StillFormat,
};
use crate::modules::{FrameAnalyzer, QualityScorer};
use crate::ports::{ConfirmationSink, DetectionProvider, FrameSource, LiveEventSink, NullEventSink};

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// The loop is running and frames are being assessed.
    Live,
    /// A still has been taken and awaits confirmation.
    Frozen,
    /// The still was handed to a sink. Terminal.
    Confirmed,
    /// Torn down without confirmation. Terminal.
    Closed,
}

impl SessionPhase {
    /// Lowercase name, for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Frozen => "frozen",
            Self::Confirmed => "confirmed",
            Self::Closed => "closed",
        }
    }
}

/// Session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Loop timing.
    pub scheduler: LoopConfig,
    /// Score at or above which capture is allowed.
    pub gate_threshold: u8,
    /// Encoding used on confirmation.
    pub still_format: StillFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scheduler: LoopConfig::default(),
            gate_threshold: CaptureGate::DEFAULT_THRESHOLD,
            still_format: StillFormat::Png,
        }
    }
}

/// The collaborators a session is built from.
pub struct LiveComponents {
    /// Camera-like frame source. Owned by the session.
    pub source: Box<dyn FrameSource>,
    /// Face detection provider.
    pub provider: Arc<dyn DetectionProvider>,
    /// Photometric analyzer.
    pub analyzer: FrameAnalyzer,
    /// Rubric scorer.
    pub scorer: QualityScorer,
    /// Receiver of live events.
    pub events: Arc<dyn LiveEventSink>,
}

impl LiveComponents {
    /// Components with default analysis and no event receiver.
    #[must_use]
    pub fn new(source: Box<dyn FrameSource>, provider: Arc<dyn DetectionProvider>) -> Self {
        Self {
            source,
            provider,
            analyzer: FrameAnalyzer::default(),
            scorer: QualityScorer::default(),
            events: Arc::new(NullEventSink),
        }
    }

    /// Replaces the event receiver.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn LiveEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replaces the photometric analyzer.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: FrameAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Replaces the scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: QualityScorer) -> Self {
        self.scorer = scorer;
        self
    }
}

/// A live capture session.
///
/// Owns the frame source and the running analysis loop. The source is
/// acquired while the session is `Live` and released as soon as a still is
/// taken or the session ends.
pub struct CaptureSession {
    ctx: Arc<TickContext>,
    config: SessionConfig,
    phase: SessionPhase,
    analysis: Option<AnalysisLoop>,
    still: Option<Frame>,
}

impl CaptureSession {
    /// Acquires the frame source and starts the analysis loop.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the device error if the frame source cannot be started.
    pub fn start(components: LiveComponents, config: SessionConfig) -> Result<Self, DeviceError> {
        let LiveComponents {
            mut source,
            provider,
            analyzer,
            scorer,
            events,
        } = components;

        source.start()?;
        info!("Frame source acquired");

        let state = Arc::new(LiveState::new(config.gate_threshold));
        let ctx = Arc::new(TickContext::new(
            source, provider, analyzer, scorer, state, events,
        ));
        let analysis = AnalysisLoop::spawn(Arc::clone(&ctx), config.scheduler);

        Ok(Self {
            ctx,
            config,
            phase: SessionPhase::Live,
            analysis: Some(analysis),
            still: None,
        })
    }

    /// Shared live state handle.
    #[must_use]
    pub fn state(&self) -> Arc<LiveState> {
        Arc::clone(&self.ctx.state)
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The frozen still, if any.
    #[must_use]
    pub const fn still(&self) -> Option<&Frame> {
        self.still.as_ref()
    }

    /// Session tuning.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn require(&self, operation: &'static str, phase: SessionPhase) -> Result<(), SessionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                operation,
                phase: self.phase.as_str(),
            })
        }
    }

    fn stop_loop(&mut self) {
        if let Some(mut analysis) = self.analysis.take() {
            analysis.stop();
        }
    }

    fn release_source(&self) {
        self.ctx.with_source(|source| {
            if source.is_started() {
                source.stop();
                info!("Frame source released");
            }
        });
    }

    /// Takes a still from the source and freezes the session.
    ///
    /// # Errors
    ///
    /// Fails when the session is not live, when the gate is blocked, or when
    /// the source cannot produce a frame. The session stays live on error.
    pub fn capture(&mut self) -> Result<&Frame, SessionError> {
        self.require("capture", SessionPhase::Live)?;
        if self.ctx.state.gate_state() != CaptureGateState::Eligible {
            return Err(SessionError::NotEligible);
        }

        let frame = self.ctx.with_source(|source| source.sample())?;
        self.stop_loop();
        self.release_source();
        self.phase = SessionPhase::Frozen;
        info!("Still captured ({}x{})", frame.width, frame.height);
        let still: &Frame = self.still.insert(frame);
        Ok(still)
    }

    /// Discards the still and resumes live assessment.
    ///
    /// # Errors
    ///
    /// Fails when the session is not frozen, or when the source cannot be
    /// re-acquired. On a device error the session stays frozen with its still.
    pub fn retake(&mut self) -> Result<(), SessionError> {
        self.require("retake", SessionPhase::Frozen)?;

        self.ctx.state.reset();
        self.ctx.with_source(|source| source.start())?;
        info!("Frame source re-acquired for retake");

        self.still = None;
        self.analysis = Some(AnalysisLoop::spawn(
            Arc::clone(&self.ctx),
            self.config.scheduler,
        ));
        self.phase = SessionPhase::Live;
        Ok(())
    }

    /// Encodes the still and hands it to `sink`.
    ///
    /// # Errors
    ///
    /// Fails when the session is not frozen, when encoding fails, or when the
    /// sink rejects the image. The still is kept on encode or sink failure.
    pub fn confirm(&mut self, sink: &dyn ConfirmationSink) -> Result<EncodedImage, SessionError> {
        self.require("confirm", SessionPhase::Frozen)?;
        let still = self.still.as_ref().ok_or(SessionError::InvalidPhase {
            operation: "confirm",
            phase: self.phase.as_str(),
        })?;

        let encoded = still
            .encode(self.config.still_format)
            .map_err(SessionError::Encode)?;
        sink.accept(&encoded).map_err(SessionError::Sink)?;

        info!(
            "Still confirmed ({} bytes, {})",
            encoded.bytes.len(),
            encoded.format.mime_type()
        );
        self.still = None;
        self.phase = SessionPhase::Confirmed;
        Ok(encoded)
    }

    /// Stops the loop and releases the source. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.stop_loop();
        self.release_source();
        if self.phase != SessionPhase::Confirmed && self.phase != SessionPhase::Closed {
            debug!("Session closed from phase {}", self.phase.as_str());
            self.phase = SessionPhase::Closed;
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("phase", &self.phase)
            .field("config", &self.config)
            .field("epoch", &self.analysis.as_ref().map(AnalysisLoop::epoch))
            .field(
                "running",
                &self.analysis.as_ref().is_some_and(AnalysisLoop::is_running),
            )
            .finish_non_exhaustive()
    }
}

