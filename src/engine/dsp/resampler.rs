use audioadapter_buffers::direct::SequentialSliceOfVecs;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};

use crate::error::{Error, Result};

fn backend_err<E: std::fmt::Display>(err: E) -> Error {
    Error::BackendFailure(format!("resampler: {}", err))
}

/// Converts interleaved clip samples to the device sample rate.
pub struct Resampler {
    resampler: Fft<f32>,
    source_rate: u32,
    target_rate: u32,
    channels: usize,
    chunk_size: usize,
    buffer: Vec<f32>,
}

impl Resampler {
    pub fn new(
        source_rate: u32,
        target_rate: u32,
        channels: usize,
        chunk_size: usize,
    ) -> Result<Self> {
        let resampler = Fft::<f32>::new(
            source_rate as usize,
            target_rate as usize,
            chunk_size,
            2,
            channels,
            FixedSync::Input,
        )
        .map_err(backend_err)?;

        Ok(Self {
            resampler,
            source_rate,
            target_rate,
            channels,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size * channels),
        })
    }

    /// Feeds samples in; returns whatever full chunks produced.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.buffer.extend_from_slice(input);

        let mut all_output = Vec::new();
        let chunk_len = self.chunk_size * self.channels;

        while self.buffer.len() >= chunk_len {
            let chunk: Vec<f32> = self.buffer.drain(0..chunk_len).collect();

            let mut input_buffer = vec![vec![0.0; self.chunk_size]; self.channels];
            for (i, frame) in chunk.chunks_exact(self.channels).enumerate() {
                for (ch, sample) in frame.iter().enumerate() {
                    input_buffer[ch][i] = *sample;
                }
            }

            let out_len = self.resampler.output_frames_next();
            let mut output_buffer = vec![vec![0.0; out_len]; self.channels];

            let input_adapter =
                SequentialSliceOfVecs::new(&input_buffer, self.channels, self.chunk_size)
                    .map_err(backend_err)?;
            let mut output_adapter =
                SequentialSliceOfVecs::new_mut(&mut output_buffer, self.channels, out_len)
                    .map_err(backend_err)?;

            self.resampler
                .process_into_buffer(&input_adapter, &mut output_adapter, None)
                .map_err(backend_err)?;

            for i in 0..out_len {
                for channel in output_buffer.iter() {
                    all_output.push(channel[i]);
                }
            }
        }

        Ok(all_output)
    }

    /// Pads the tail with silence and pushes it through.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }

        let remaining_frames = self.buffer.len() / self.channels;
        let padding = (self.chunk_size - remaining_frames) * self.channels;
        self.buffer.extend(std::iter::repeat(0.0).take(padding));

        self.process(&[])
    }

    /// Drops buffered input and filter history, for a restart from frame 0.
    pub fn reset(&mut self) -> Result<()> {
        *self = Resampler::new(self.source_rate, self.target_rate, self.channels, self.chunk_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_on_empty_input_produces_nothing() {
        let mut resampler = Resampler::new(22050, 44100, 1, 256).unwrap();
        assert!(resampler.flush().unwrap().is_empty());
    }

    #[test]
    fn holds_partial_chunks_until_flush() {
        let mut resampler = Resampler::new(22050, 44100, 2, 256).unwrap();
        let partial = vec![0.25; 100 * 2];
        assert!(resampler.process(&partial).unwrap().is_empty());

        let tail = resampler.flush().unwrap();
        assert!(!tail.is_empty());
        assert_eq!(tail.len() % 2, 0);
    }
}
