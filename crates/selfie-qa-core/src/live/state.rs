//! Shared live state.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{CaptureGate, CaptureGateState, GateTransition, QualityAssessment};

/// Point-in-time copy of the live state.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSnapshot {
    /// Epoch of the most recently started loop.
    pub epoch: u64,
    /// Whether that loop is still accepting commits.
    pub running: bool,
    /// Gate state after the latest commit.
    pub gate: CaptureGateState,
    /// Latest committed assessment.
    pub assessment: Option<QualityAssessment>,
    /// Commits since the last reset.
    pub committed_ticks: u64,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    /// Gate state after the commit.
    pub gate: CaptureGateState,
    /// Set when the commit changed the gate state.
    pub transition: Option<GateTransition>,
}

#[derive(Debug)]
struct Inner {
    epoch: u64,
    running: bool,
    gate: CaptureGate,
    assessment: Option<QualityAssessment>,
    committed_ticks: u64,
}

/// Latest assessment and gate state, shared between the loop and readers.
///
/// The assessment and gate are replaced together under one write lock. Every
/// loop owns an epoch; once the epoch is retired its commits are refused, so
/// a provider answer arriving after `stop` cannot touch the state.
#[derive(Debug)]
pub struct LiveState {
    inner: RwLock<Inner>,
}

impl LiveState {
    /// Creates an empty state whose gate uses `threshold`.
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self {
            inner: RwLock::new(Inner {
                epoch: 0,
                running: false,
                gate: CaptureGate::new(threshold),
                assessment: None,
                committed_ticks: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> LiveSnapshot {
        let inner = self.read();
        LiveSnapshot {
            epoch: inner.epoch,
            running: inner.running,
            gate: inner.gate.state(),
            assessment: inner.assessment.clone(),
            committed_ticks: inner.committed_ticks,
        }
    }

    /// Current gate state.
    #[must_use]
    pub fn gate_state(&self) -> CaptureGateState {
        self.read().gate.state()
    }

    /// Latest committed assessment.
    #[must_use]
    pub fn assessment(&self) -> Option<QualityAssessment> {
        self.read().assessment.clone()
    }

    /// True while `epoch` belongs to a running loop.
    #[must_use]
    pub fn is_current(&self, epoch: u64) -> bool {
        let inner = self.read();
        inner.running && inner.epoch == epoch
    }

    /// Opens a new epoch and returns it. Any previous epoch is retired.
    pub fn begin_epoch(&self) -> u64 {
        let mut inner = self.write();
        inner.epoch += 1;
        inner.running = true;
        inner.epoch
    }

    /// Retires `epoch`. Returns false if it was not the running epoch.
    pub fn retire(&self, epoch: u64) -> bool {
        let mut inner = self.write();
        if inner.running && inner.epoch == epoch {
            inner.running = false;
            true
        } else {
            false
        }
    }

    /// Replaces the assessment and recomputes the gate.
    ///
    /// Returns `None`, leaving the state untouched, if `epoch` is retired.
    pub fn commit(&self, epoch: u64, assessment: QualityAssessment) -> Option<Committed> {
        let mut inner = self.write();
        if !inner.running || inner.epoch != epoch {
            return None;
        }
        let transition = inner.gate.observe(assessment.overall_score);
        inner.assessment = Some(assessment);
        inner.committed_ticks += 1;
        Some(Committed {
            gate: inner.gate.state(),
            transition,
        })
    }

    /// Blocks the gate and clears the assessment.
    pub fn reset(&self) {
        let mut inner = self.write();
        inner.gate.reset();
        inner.assessment = None;
        inner.committed_ticks = 0;
    }
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new(CaptureGate::DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectionResult, PhotometricStats};
    use crate::modules::QualityScorer;

    fn assessment(brightness: f32) -> QualityAssessment {
        QualityScorer::default().score(
            &PhotometricStats {
                brightness,
                contrast: 50.0,
                sharpness: 80.0,
            },
            &DetectionResult::not_detected(),
        )
    }

    #[test]
    fn test_starts_empty_and_blocked() {
        let snapshot = LiveState::default().snapshot();
        assert_eq!(snapshot.gate, CaptureGateState::Blocked);
        assert!(snapshot.assessment.is_none());
        assert!(!snapshot.running);
    }

    #[test]
    fn test_commit_requires_running_epoch() {
        let state = LiveState::default();
        assert!(state.commit(0, assessment(50.0)).is_none());

        let epoch = state.begin_epoch();
        let committed = state.commit(epoch, assessment(50.0));
        assert!(committed.is_some());
        assert_eq!(state.snapshot().committed_ticks, 1);
    }

    #[test]
    fn test_retired_epoch_cannot_commit() {
        let state = LiveState::new(10);
        let epoch = state.begin_epoch();
        state.commit(epoch, assessment(50.0));
        let before = state.snapshot();

        assert!(state.retire(epoch));
        assert!(state.commit(epoch, assessment(5.0)).is_none());

        let after = state.snapshot();
        assert_eq!(after.assessment, before.assessment);
        assert_eq!(after.gate, before.gate);
        assert_eq!(after.committed_ticks, 1);
    }

    #[test]
    fn test_new_epoch_retires_previous() {
        let state = LiveState::default();
        let first = state.begin_epoch();
        let second = state.begin_epoch();
        assert_ne!(first, second);
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
        assert!(state.commit(first, assessment(50.0)).is_none());
        assert!(!state.retire(first));
    }

    #[test]
    fn test_commit_moves_gate() {
        // No face: photometric points only, 40 when lit, 20 when dark.
        let state = LiveState::new(40);
        let epoch = state.begin_epoch();

        let up = state.commit(epoch, assessment(50.0));
        assert_eq!(
            up.map(|c| c.gate),
            Some(CaptureGateState::Eligible)
        );
        assert!(up.and_then(|c| c.transition).is_some());

        let down = state.commit(epoch, assessment(5.0));
        assert_eq!(down.map(|c| c.gate), Some(CaptureGateState::Blocked));
    }

    #[test]
    fn test_reset_clears_assessment_and_blocks() {
        let state = LiveState::new(40);
        let epoch = state.begin_epoch();
        state.commit(epoch, assessment(50.0));
        state.reset();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.gate, CaptureGateState::Blocked);
        assert!(snapshot.assessment.is_none());
        assert_eq!(snapshot.committed_ticks, 0);
    }
}
