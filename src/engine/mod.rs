//! cpal + symphonia rendering backend.
//!
//! Every clip gets its own session: a decode thread pushing converted
//! samples into a ring buffer and a cpal stream draining it.

pub mod buffer;
pub mod clock;
pub mod decoder;
pub mod dsp;
pub mod output;
pub mod session;

pub use session::ClipSession;

use tracing::debug;

use crate::error::Result;
use crate::playback::{AssetDirectory, AudioBackend, ClipRequest, ClipResolver, CompletionNotifier};

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Length of the sample queue between decoder and device.
    pub buffer_ms: u32,
}

impl EngineSettings {
    /// Queue capacity in interleaved samples.
    pub fn buffer_capacity(&self, sample_rate: u32, channels: u16) -> usize {
        let samples = sample_rate as u64 * channels as u64 * self.buffer_ms as u64 / 1000;
        (samples as usize).max(1024)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { buffer_ms: 500 }
    }
}

/// Opens clips from disk and renders them on the default output device.
pub struct AudioEngine<R = AssetDirectory> {
    resolver: R,
    settings: EngineSettings,
}

impl<R: ClipResolver> AudioEngine<R> {
    pub fn new(resolver: R, settings: EngineSettings) -> Self {
        Self { resolver, settings }
    }
}

impl<R: ClipResolver> AudioBackend for AudioEngine<R> {
    type Session = ClipSession;

    fn open(&mut self, request: &ClipRequest, notifier: CompletionNotifier) -> Result<ClipSession> {
        let path = self.resolver.resolve(request)?;
        debug!("Resolved {} to {}", request, path.display());
        ClipSession::open(&path, &self.settings, notifier)
    }
}
