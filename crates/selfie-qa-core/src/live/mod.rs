//! Live analysis: shared state, the scheduler loop and the capture session.

mod scheduler;
mod session;
mod state;

pub use scheduler::LoopConfig;
pub use session::{CaptureSession, LiveComponents, SessionConfig, SessionPhase};
pub use state::{Committed, LiveSnapshot, LiveState};
