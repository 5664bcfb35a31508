//! Fixed-cadence analysis loop.
//!
//! One timer task fires every `cadence`. Each tick samples the frame source,
//! runs photometric analysis and the detection provider, scores the result
//! and commits it to [`LiveState`]. Tick work runs on its own task so a slow
//! provider never delays the timer. While that work is pending, further
//! ticks are skipped rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::state::LiveState;
use crate::domain::{AnalysisFailure, DeviceError, Frame};
use crate::modules::{FrameAnalyzer, QualityScorer};
use crate::ports::{DetectionProvider, FrameSource, LiveEvent, LiveEventSink, SkipReason};

/// Timing of the analysis loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Interval between ticks.
    pub cadence: Duration,
    /// Longest a provider call may take before its tick is abandoned.
    pub latency_budget: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(1500),
            latency_budget: Duration::from_millis(500),
        }
    }
}

/// Everything a tick needs, shared by every loop of one session.
pub(crate) struct TickContext {
    pub(crate) source: Mutex<Box<dyn FrameSource>>,
    pub(crate) provider: Arc<dyn DetectionProvider>,
    pub(crate) analyzer: FrameAnalyzer,
    pub(crate) scorer: QualityScorer,
    pub(crate) state: Arc<LiveState>,
    pub(crate) events: Arc<dyn LiveEventSink>,
    /// Set while a tick's work is pending, across loop restarts.
    in_flight: AtomicBool,
}

impl TickContext {
    pub(crate) fn new(
        source: Box<dyn FrameSource>,
        provider: Arc<dyn DetectionProvider>,
        analyzer: FrameAnalyzer,
        scorer: QualityScorer,
        state: Arc<LiveState>,
        events: Arc<dyn LiveEventSink>,
    ) -> Self {
        Self {
            source: Mutex::new(source),
            provider,
            analyzer,
            scorer,
            state,
            events,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Runs `f` with exclusive access to the frame source.
    pub(crate) fn with_source<T>(&self, f: impl FnOnce(&mut dyn FrameSource) -> T) -> T {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        f(source.as_mut())
    }

    fn sample(&self) -> Result<Frame, DeviceError> {
        self.with_source(|source| source.sample())
    }

    /// Claims the in-flight slot, or returns `None` if it is taken.
    fn try_claim(self: &Arc<Self>) -> Option<InFlightGuard> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(InFlightGuard(Arc::clone(self)))
        }
    }

    async fn run_tick(&self, epoch: u64, tick: u64, budget: Duration) {
        if !self.state.is_current(epoch) {
            return;
        }

        let frame = match self.sample() {
            Ok(frame) => frame,
            Err(err) => return self.fail(epoch, tick, err.into()),
        };

        let photometric = self.analyzer.analyze(&frame);
        if let Some(failure) = photometric.failure {
            return self.fail(epoch, tick, failure);
        }

        let detection = match time::timeout(budget, self.provider.analyze(&frame)).await {
            Ok(detection) => detection.sanitized(),
            Err(_) => return self.fail(epoch, tick, AnalysisFailure::ProviderTimeout(budget)),
        };

        let assessment = self.scorer.score(&photometric.stats, &detection);
        let score = assessment.overall_score;
        match self.state.commit(epoch, assessment.clone()) {
            Some(committed) => {
                debug!(
                    "Tick {tick} committed: score={score} gate={:?} provider={}",
                    committed.gate,
                    self.provider.name()
                );
                if let Some(transition) = committed.transition {
                    info!("Capture gate {:?} -> {:?}", transition.from, transition.to);
                }
                self.events.on_event(LiveEvent::TickCommitted {
                    tick,
                    assessment,
                    gate: committed.gate,
                    transition: committed.transition,
                });
            }
            None => {
                debug!("Tick {tick} of retired epoch {epoch} discarded");
                self.events.on_event(LiveEvent::LateResultDiscarded { tick });
            }
        }
    }

    fn fail(&self, epoch: u64, tick: u64, failure: AnalysisFailure) {
        if self.state.is_current(epoch) {
            warn!("Tick {tick} analysis failed: {failure}");
            self.events.on_event(LiveEvent::AnalysisFailed { tick, failure });
        } else {
            debug!("Tick {tick} of retired epoch {epoch} failed after stop: {failure}");
            self.events.on_event(LiveEvent::LateResultDiscarded { tick });
        }
    }
}

/// Releases the in-flight slot when tick work ends, even by panic.
struct InFlightGuard(Arc<TickContext>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

/// Handle to a running loop. Dropping it stops the loop.
pub(crate) struct AnalysisLoop {
    ctx: Arc<TickContext>,
    epoch: u64,
    ticker: Option<JoinHandle<()>>,
}

impl AnalysisLoop {
    /// Opens a new epoch and spawns its timer task.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(ctx: Arc<TickContext>, config: LoopConfig) -> Self {
        let epoch = ctx.state.begin_epoch();
        info!(
            "Analysis loop {epoch} started (cadence {:?}, budget {:?}, provider {})",
            config.cadence,
            config.latency_budget,
            ctx.provider.name()
        );
        ctx.events.on_event(LiveEvent::Started { epoch });
        let ticker = tokio::spawn(run_ticker(Arc::clone(&ctx), epoch, config));
        Self {
            ctx,
            epoch,
            ticker: Some(ticker),
        }
    }

    /// Epoch owned by this loop.
    pub(crate) const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether `stop` has not yet been called.
    pub(crate) const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Retires the epoch and cancels future ticks.
    ///
    /// Tick work already in flight is left to finish; its result is discarded.
    pub(crate) fn stop(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        self.ctx.state.retire(self.epoch);
        ticker.abort();
        info!("Analysis loop {} stopped", self.epoch);
        self.ctx
            .events
            .on_event(LiveEvent::Stopped { epoch: self.epoch });
    }
}

impl Drop for AnalysisLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticker(ctx: Arc<TickContext>, epoch: u64, config: LoopConfig) {
    let cadence = config.cadence.max(Duration::from_millis(1));
    let mut interval = time::interval_at(Instant::now() + cadence, cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick = 0u64;
    loop {
        interval.tick().await;
        tick += 1;

        let Some(guard) = ctx.try_claim() else {
            debug!("Tick {tick} skipped: previous tick still in flight");
            ctx.events.on_event(LiveEvent::TickSkipped {
                tick,
                reason: SkipReason::InFlight,
            });
            continue;
        };

        let worker = Arc::clone(&ctx);
        tokio::spawn(async move {
            let _guard = guard;
            worker.run_tick(epoch, tick, config.latency_budget).await;
        });
    }
}
