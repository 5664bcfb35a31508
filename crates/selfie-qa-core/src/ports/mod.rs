//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod confirmation;
mod detection;
mod events;
mod frame_source;
mod result_output;

pub use confirmation::ConfirmationSink;
pub use detection::DetectionProvider;
pub use events::{LiveEvent, LiveEventSink, NullEventSink, SkipReason};
pub use frame_source::FrameSource;
pub use result_output::{AssessmentRecord, ResultOutput};
