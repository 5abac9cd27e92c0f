pub mod symphonia_decoder;

use crate::error::Result;

pub trait ClipDecoder: Send {
    /// Decodes the next block of interleaved samples.
    /// Returns `Ok(None)` when the end of the clip is reached.
    fn decode_next(&mut self) -> Result<Option<Vec<f32>>>;

    /// Returns the sample rate of the clip.
    fn sample_rate(&self) -> u32;

    /// Returns the number of channels.
    fn channels(&self) -> u32;

    /// Moves the read position back to the first frame.
    fn rewind(&mut self) -> Result<()>;

    /// Returns the total duration of the clip in seconds, if known.
    fn duration(&self) -> Option<f64>;
}
