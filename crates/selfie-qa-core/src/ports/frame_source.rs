//! Frame source port for camera-like devices.

use crate::domain::{DeviceError, Frame};

/// Port for a device that produces frames.
///
/// A source is owned by exactly one session. `start` acquires the device,
/// `stop` releases it, and `sample` copies the current frame out
/// synchronously.
pub trait FrameSource: Send {
    /// Acquires the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is missing or access is denied.
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Releases the device. Stopping a stopped source is a no-op.
    fn stop(&mut self);

    /// Samples the current frame.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotStarted`] before `start`, or
    /// [`DeviceError::SampleFailed`] if the device could not produce a frame.
    fn sample(&mut self) -> Result<Frame, DeviceError>;

    /// Whether the device is currently acquired.
    fn is_started(&self) -> bool;
}
