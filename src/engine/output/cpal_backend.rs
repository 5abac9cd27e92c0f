use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::engine::buffer::SampleConsumer;
use crate::engine::clock::{Clock, RenderState};
use crate::engine::output::AudioOutput;
use crate::error::{Error, Result};
use crate::playback::CompletionNotifier;

/// The default output device and the format its stream will run at.
pub struct OutputDevice {
    device: cpal::Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl OutputDevice {
    pub fn default_output() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::ResourceUnavailable("no output device available".into()))?;

        let supported = device
            .default_output_config()
            .map_err(|e| Error::ResourceUnavailable(format!("output config: {}", e)))?;
        let sample_format = supported.sample_format();

        Ok(Self {
            device,
            config: supported.into(),
            sample_format,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

/// One cpal output stream, fed from a session's sample queue.
pub struct CpalBackend {
    stream: Stream,
    consumer: Arc<Mutex<SampleConsumer>>,
}

impl CpalBackend {
    /// Builds the stream paused. The callback reports the clip finished
    /// once the decoder hit the end and the queue ran dry.
    pub fn new(
        device: &OutputDevice,
        consumer: SampleConsumer,
        clock: Arc<Clock>,
        notifier: CompletionNotifier,
    ) -> Result<Self> {
        let consumer = Arc::new(Mutex::new(consumer));

        let stream = match device.sample_format {
            SampleFormat::F32 => build_stream::<f32>(device, consumer.clone(), clock, notifier),
            SampleFormat::I16 => build_stream::<i16>(device, consumer.clone(), clock, notifier),
            SampleFormat::U16 => build_stream::<u16>(device, consumer.clone(), clock, notifier),
            other => {
                return Err(Error::ResourceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }?;

        Ok(Self { stream, consumer })
    }
}

impl AudioOutput for CpalBackend {
    fn start(&mut self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| Error::BackendFailure(format!("stream play: {}", e)))
    }

    fn pause(&mut self) -> Result<()> {
        self.stream
            .pause()
            .map_err(|e| Error::BackendFailure(format!("stream pause: {}", e)))
    }

    fn flush(&mut self) {
        let dropped = self.consumer.lock().clear();
        debug!("Flushed {} queued samples", dropped);
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}

fn build_stream<T>(
    device: &OutputDevice,
    consumer: Arc<Mutex<SampleConsumer>>,
    clock: Arc<Clock>,
    notifier: CompletionNotifier,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let err_notifier = notifier.clone();

    device
        .device
        .build_output_stream(
            &device.config,
            move |data: &mut [T], _| render(data, &consumer, &clock, &notifier),
            move |err| {
                warn!("Output stream error: {}", err);
                err_notifier.failed(err.to_string());
            },
            None,
        )
        .map_err(|e| Error::ResourceUnavailable(format!("output stream: {}", e)))
}

fn render<T>(
    data: &mut [T],
    consumer: &Mutex<SampleConsumer>,
    clock: &Clock,
    notifier: &CompletionNotifier,
) where
    T: Sample + FromSample<f32>,
{
    if clock.state() != RenderState::Playing {
        data.fill(T::from_sample(0.0f32));
        return;
    }

    // Read before draining: once set, every sample is already queued.
    let eos = clock.is_eos();
    let volume = clock.volume();

    let mut read = 0;
    {
        let mut consumer = consumer.lock();
        for out in data.iter_mut() {
            match consumer.pop() {
                Some(sample) => {
                    *out = T::from_sample(sample * volume);
                    read += 1;
                }
                None => break,
            }
        }
    }
    data[read..].fill(T::from_sample(0.0f32));
    clock.advance_samples(read as u64);

    if eos && read < data.len() {
        clock.set_state(RenderState::Stopped);
        notifier.finished();
    }
}
