//! Selfie QA Adapters - External adapters for selfie-qa.
//!
//! This crate provides adapters for:
//! - Filesystem image discovery and a looping still-image frame source
//! - A remote HTTP detection provider
//! - A file confirmation sink

pub mod fs;
pub mod remote;
pub mod sink;

pub use fs::{load_frame, ImageFiles, StillFrameSource};
pub use remote::{RemoteDetectionProvider, RemoteProviderConfig};
pub use sink::FileConfirmationSink;
