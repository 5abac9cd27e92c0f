pub mod cpal_backend;

use crate::error::Result;

/// Device side of a clip session.
pub trait AudioOutput {
    /// Starts (or restarts) pulling samples to the device.
    fn start(&mut self) -> Result<()>;

    /// Stops pulling samples; whatever is queued stays queued.
    fn pause(&mut self) -> Result<()>;

    /// Drops samples already queued for the device.
    fn flush(&mut self);
}
