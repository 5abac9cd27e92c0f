use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::buffer::{sample_queue, SampleProducer};
use crate::engine::clock::{Clock, RenderState};
use crate::engine::decoder::{symphonia_decoder::SymphoniaDecoder, ClipDecoder};
use crate::engine::dsp::{remix_channels, resampler::Resampler};
use crate::engine::output::{
    cpal_backend::{CpalBackend, OutputDevice},
    AudioOutput,
};
use crate::engine::EngineSettings;
use crate::error::{Error, Result};
use crate::events::PlaybackToken;
use crate::playback::{CompletionNotifier, PlaybackSession};

const RESAMPLER_CHUNK: usize = 1024;
const FULL_BUFFER_BACKOFF: Duration = Duration::from_millis(5);
const REWIND_TIMEOUT: Duration = Duration::from_secs(1);

enum DecoderCommand {
    /// Seek to frame 0, acknowledge, then wait for `Resume`.
    Rewind(mpsc::SyncSender<()>),
    Resume,
    Stop,
}

/// Decoder output converted to the device format.
struct Pipeline {
    decoder: Box<dyn ClipDecoder>,
    resampler: Option<Resampler>,
    source_channels: usize,
    target_channels: usize,
}

impl Pipeline {
    fn new(
        decoder: Box<dyn ClipDecoder>,
        target_rate: u32,
        target_channels: usize,
    ) -> Result<Self> {
        let source_rate = decoder.sample_rate();
        let source_channels = decoder.channels() as usize;

        let resampler = if source_rate != target_rate {
            debug!("Resampling clip {}Hz -> {}Hz", source_rate, target_rate);
            Some(Resampler::new(source_rate, target_rate, source_channels, RESAMPLER_CHUNK)?)
        } else {
            None
        };

        Ok(Self {
            decoder,
            resampler,
            source_channels,
            target_channels,
        })
    }

    fn next_block(&mut self) -> Result<Option<Vec<f32>>> {
        let Some(samples) = self.decoder.decode_next()? else {
            return Ok(None);
        };
        let samples = match self.resampler.as_mut() {
            Some(resampler) => resampler.process(&samples)?,
            None => samples,
        };
        Ok(Some(remix_channels(&samples, self.source_channels, self.target_channels)))
    }

    fn flush(&mut self) -> Result<Vec<f32>> {
        match self.resampler.as_mut() {
            Some(resampler) => {
                let tail = resampler.flush()?;
                Ok(remix_channels(&tail, self.source_channels, self.target_channels))
            }
            None => Ok(Vec::new()),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.decoder.rewind()?;
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset()?;
        }
        Ok(())
    }
}

struct DecodeWorker {
    pipeline: Pipeline,
    producer: SampleProducer,
    clock: Arc<Clock>,
    notifier: CompletionNotifier,
    commands: Receiver<DecoderCommand>,
}

impl DecodeWorker {
    fn run(mut self) {
        let mut pending: Vec<f32> = Vec::new();
        let mut cursor = 0;
        let mut draining = false;
        // Parked: nothing to decode until a command arrives.
        let mut parked = false;

        loop {
            let command = if parked {
                match self.commands.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                }
            } else {
                match self.commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            };

            match command {
                Some(DecoderCommand::Stop) => break,
                Some(DecoderCommand::Rewind(ack)) => {
                    pending.clear();
                    cursor = 0;
                    draining = false;
                    parked = true;
                    if let Err(err) = self.pipeline.rewind() {
                        warn!("Rewind failed: {}", err);
                        self.notifier.failed(err.to_string());
                    }
                    self.clock.set_eos(false);
                    let _ = ack.send(());
                    continue;
                }
                Some(DecoderCommand::Resume) => {
                    parked = false;
                    continue;
                }
                None => {}
            }

            if cursor < pending.len() {
                if self.producer.vacant_len() == 0 {
                    thread::sleep(FULL_BUFFER_BACKOFF);
                    continue;
                }
                cursor += self.producer.push_slice(&pending[cursor..]);
                continue;
            }
            pending.clear();
            cursor = 0;

            if draining {
                self.clock.set_eos(true);
                parked = true;
                continue;
            }

            match self.pipeline.next_block() {
                Ok(Some(block)) => pending = block,
                Ok(None) => {
                    draining = true;
                    match self.pipeline.flush() {
                        Ok(tail) => pending = tail,
                        Err(err) => warn!("Dropping resampler tail: {}", err),
                    }
                }
                Err(err) => {
                    warn!("Decoding stopped: {}", err);
                    self.notifier.failed(err.to_string());
                    parked = true;
                }
            }
        }

        debug!("Decode worker for {} exiting", self.notifier.token());
    }
}

/// A live clip: decode thread, sample queue and output stream.
/// Dropping the session releases all of them.
pub struct ClipSession {
    token: PlaybackToken,
    clock: Arc<Clock>,
    output: Box<dyn AudioOutput>,
    notifier: CompletionNotifier,
    command_tx: Sender<DecoderCommand>,
    decode_thread: Option<JoinHandle<()>>,
}

impl ClipSession {
    pub fn open(
        path: &Path,
        settings: &EngineSettings,
        notifier: CompletionNotifier,
    ) -> Result<Self> {
        let token = notifier.token();
        let decoder = SymphoniaDecoder::open(path)?;
        let length = decoder.duration();

        let device = OutputDevice::default_output()?;
        let clock = Arc::new(Clock::new(device.sample_rate(), device.channels() as u8));
        let pipeline = Pipeline::new(
            Box::new(decoder),
            device.sample_rate(),
            device.channels() as usize,
        )
        .map_err(|e| Error::ResourceUnavailable(e.to_string()))?;

        let capacity = settings.buffer_capacity(device.sample_rate(), device.channels());
        let (producer, consumer) = sample_queue(capacity);
        let output = CpalBackend::new(&device, consumer, clock.clone(), notifier.clone())?;

        let (command_tx, commands) = mpsc::channel();
        let worker = DecodeWorker {
            pipeline,
            producer,
            clock: clock.clone(),
            notifier: notifier.clone(),
            commands,
        };
        let decode_thread = thread::Builder::new()
            .name(format!("clip-decode-{}", token.value()))
            .spawn(move || worker.run())
            .map_err(|e| Error::ResourceUnavailable(format!("decode thread: {}", e)))?;

        debug!(
            "Opened session {} for {} ({:?} s)",
            token,
            path.display(),
            length
        );

        Ok(Self {
            token,
            clock,
            output: Box::new(output),
            notifier,
            command_tx,
            decode_thread: Some(decode_thread),
        })
    }

    pub fn position_secs(&self) -> f64 {
        self.clock.time_secs()
    }

    fn send(&self, command: DecoderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::BackendFailure("decode worker is gone".into()))
    }
}

impl PlaybackSession for ClipSession {
    fn start(&mut self) -> Result<()> {
        self.send(DecoderCommand::Resume)?;
        self.clock.set_state(RenderState::Playing);
        self.output.start()
    }

    fn pause(&mut self) -> Result<()> {
        self.clock.set_state(RenderState::Paused);
        self.output.pause()
    }

    fn rewind(&mut self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        self.send(DecoderCommand::Rewind(ack_tx))?;
        ack_rx
            .recv_timeout(REWIND_TIMEOUT)
            .map_err(|_| Error::BackendFailure("decode worker did not rewind".into()))?;

        // The worker is parked now, so nothing refills the queue behind us.
        self.output.flush();
        self.clock.reset_position();
        self.notifier.rearm();
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.clock.set_volume(volume);
    }

    fn release(self) {
        drop(self);
    }
}

impl Drop for ClipSession {
    fn drop(&mut self) {
        self.clock.set_state(RenderState::Stopped);
        if let Err(err) = self.output.pause() {
            debug!("Pausing {} on release: {}", self.token, err);
        }

        let _ = self.command_tx.send(DecoderCommand::Stop);
        if let Some(handle) = self.decode_thread.take() {
            if handle.join().is_err() {
                warn!("Decode worker for {} panicked", self.token);
            }
        }
        debug!("Released session {} at {:.2}s", self.token, self.position_secs());
    }
}
