//! Live event port for UI integration.

use crate::domain::{AnalysisFailure, CaptureGateState, GateTransition, QualityAssessment};

/// Why a tick did no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The previous tick's work was still pending.
    InFlight,
}

/// Events emitted by a running analysis loop.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// A loop started with the given epoch.
    Started {
        /// Loop epoch.
        epoch: u64,
    },
    /// A tick's assessment replaced the live state.
    TickCommitted {
        /// Tick number within the epoch (1-based).
        tick: u64,
        /// The committed assessment.
        assessment: QualityAssessment,
        /// Gate state after the commit.
        gate: CaptureGateState,
        /// Set when the commit changed the gate state.
        transition: Option<GateTransition>,
    },
    /// A tick fired but did no work.
    TickSkipped {
        /// Tick number within the epoch.
        tick: u64,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// A tick's analysis failed; the previous assessment is retained.
    AnalysisFailed {
        /// Tick number within the epoch.
        tick: u64,
        /// What went wrong.
        failure: AnalysisFailure,
    },
    /// A result arrived after its loop was stopped and was dropped.
    LateResultDiscarded {
        /// Tick number within the retired epoch.
        tick: u64,
    },
    /// A loop stopped.
    Stopped {
        /// Loop epoch.
        epoch: u64,
    },
}

/// Port for receiving live events.
pub trait LiveEventSink: Send + Sync {
    /// Called when a live event occurs.
    fn on_event(&self, event: LiveEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl LiveEventSink for NullEventSink {
    fn on_event(&self, _event: LiveEvent) {}
}
