//! Capture gate state machine.

use serde::{Deserialize, Serialize};

/// Whether the manual capture action is currently allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureGateState {
    /// Capture disabled. Initial state.
    #[default]
    Blocked,
    /// Capture enabled.
    Eligible,
}

/// A change of gate state caused by one committed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateTransition {
    /// State before the score.
    pub from: CaptureGateState,
    /// State after the score.
    pub to: CaptureGateState,
}

/// Two-state gate driven by the latest overall score.
///
/// The gate is advisory. It never triggers a capture and applies no
/// hysteresis: every committed score decides the state on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGate {
    state: CaptureGateState,
    threshold: u8,
}

impl CaptureGate {
    /// Score at or above which capture is allowed.
    pub const DEFAULT_THRESHOLD: u8 = 50;

    /// Creates a blocked gate with the given threshold.
    #[must_use]
    pub const fn new(threshold: u8) -> Self {
        Self {
            state: CaptureGateState::Blocked,
            threshold,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CaptureGateState {
        self.state
    }

    /// Eligibility threshold.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Feeds a committed score, returning the transition if the state changed.
    pub fn observe(&mut self, overall_score: u8) -> Option<GateTransition> {
        let next = if overall_score >= self.threshold {
            CaptureGateState::Eligible
        } else {
            CaptureGateState::Blocked
        };
        let from = std::mem::replace(&mut self.state, next);
        (from != next).then_some(GateTransition { from, to: next })
    }

    /// Returns the gate to `Blocked`.
    pub fn reset(&mut self) {
        self.state = CaptureGateState::Blocked;
    }
}

impl Default for CaptureGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}
