//! Confirmation sink port.

use crate::domain::EncodedImage;

/// Port receiving the confirmed still.
pub trait ConfirmationSink: Send + Sync {
    /// Accepts the encoded still.
    ///
    /// # Errors
    ///
    /// Returns an error if the still could not be stored or forwarded.
    fn accept(&self, image: &EncodedImage) -> anyhow::Result<()>;
}
