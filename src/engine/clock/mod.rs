use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Render state of one clip session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderState {
    Stopped = 0,
    Playing = 1,
    Paused = 2,
}

impl From<u8> for RenderState {
    fn from(value: u8) -> Self {
        match value {
            1 => RenderState::Playing,
            2 => RenderState::Paused,
            _ => RenderState::Stopped,
        }
    }
}

/// Timing and control flags shared between the control thread, the
/// decode thread and the output callback of one session.
/// The mutable parts are atomic so the output callback never blocks on them.
pub struct Clock {
    /// Frames rendered since the clip (re)started.
    frame_pos: AtomicU64,
    sample_rate: u32,
    channels: u8,
    state: AtomicU8,
    /// Output gain stored as `f32` bits.
    volume: AtomicU32,
    /// Set by the decode thread once every sample is in the buffer.
    end_of_stream: AtomicBool,
}

impl Clock {
    pub fn new(sample_rate: u32, channels: u8) -> Self {
        Self {
            frame_pos: AtomicU64::new(0),
            sample_rate,
            channels,
            state: AtomicU8::new(RenderState::Stopped as u8),
            volume: AtomicU32::new(1.0f32.to_bits()),
            end_of_stream: AtomicBool::new(false),
        }
    }

    pub fn frame_pos(&self) -> u64 {
        self.frame_pos.load(Ordering::Relaxed)
    }

    pub fn reset_position(&self) {
        self.frame_pos.store(0, Ordering::SeqCst);
    }

    /// Advances the position by a block of interleaved samples.
    pub fn advance_samples(&self, samples: u64) {
        let channels = self.channels().max(1) as u64;
        if self.state() == RenderState::Playing {
            self.frame_pos.fetch_add(samples / channels, Ordering::Relaxed);
        }
    }

    pub fn time_secs(&self) -> f64 {
        let rate = self.sample_rate() as f64;
        if rate > 0.0 {
            self.frame_pos() as f64 / rate
        } else {
            0.0
        }
    }

    pub fn state(&self) -> RenderState {
        RenderState::from(self.state.load(Ordering::Relaxed))
    }

    pub fn set_state(&self, state: RenderState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::SeqCst);
    }

    pub fn is_eos(&self) -> bool {
        self.end_of_stream.load(Ordering::Acquire)
    }

    pub fn set_eos(&self, eos: bool) {
        self.end_of_stream.store(eos, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_only_advances_while_playing() {
        let clock = Clock::new(48000, 2);
        assert_eq!((clock.sample_rate(), clock.channels()), (48000, 2));
        clock.advance_samples(960);
        assert_eq!(clock.frame_pos(), 0);

        clock.set_state(RenderState::Playing);
        clock.advance_samples(960);
        assert_eq!(clock.frame_pos(), 480);
        assert!((clock.time_secs() - 0.01).abs() < 1e-9);

        clock.reset_position();
        assert_eq!(clock.frame_pos(), 0);
    }

    #[test]
    fn volume_is_clamped() {
        let clock = Clock::new(44100, 2);
        assert_eq!(clock.volume(), 1.0);
        clock.set_volume(0.5);
        assert_eq!(clock.volume(), 0.5);
        clock.set_volume(3.0);
        assert_eq!(clock.volume(), 1.0);
    }
}
