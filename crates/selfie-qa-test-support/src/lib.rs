//! Test support utilities for selfie-qa.
//!
//! Provides mocks for every port and synthetic frame builders for testing
//! the live analysis pipeline.
//!
//! # Example
//!
//! ```
//! use selfie_qa_test_support::{MockFrameSource, SyntheticFrameBuilder};
//!
//! // Create synthetic test frames
//! let face = SyntheticFrameBuilder::face(240, 240);
//! let dark = SyntheticFrameBuilder::dark(240, 240);
//!
//! // Create a mock camera replaying them
//! let source = MockFrameSource::new(vec![face, dark]);
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticFrameBuilder, SKIN};
pub use mocks::{MockConfirmationSink, MockDetectionProvider, MockEventSink, MockFrameSource};
