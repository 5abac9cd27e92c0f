use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::engine::decoder::ClipDecoder;
use crate::error::{Error, Result};

pub struct SymphoniaDecoder {
    path: PathBuf,
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u32,
    duration: Option<f64>,
}

impl SymphoniaDecoder {
    /// Opens and probes a clip. Every failure here means the clip cannot
    /// be played at all, so it is reported as `ResourceUnavailable`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| {
            Error::ResourceUnavailable(format!("{}: {}", path.display(), reason))
        };

        let file = File::open(&path).map_err(|e| unavailable(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| unavailable(e.to_string()))?;
        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| unavailable("no supported audio track".to_string()))?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u32)
            .unwrap_or(2);
        let duration = track
            .codec_params
            .n_frames
            .map(|frames| frames as f64 / sample_rate as f64);

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| unavailable(e.to_string()))?;

        debug!(
            "Opened clip {} ({} Hz, {} ch, {:?} s)",
            path.display(),
            sample_rate,
            channels,
            duration
        );

        Ok(Self {
            path,
            reader,
            decoder,
            track_id,
            sample_rate,
            channels,
            duration,
        })
    }
}

impl ClipDecoder for SymphoniaDecoder {
    fn decode_next(&mut self) -> Result<Option<Vec<f32>>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None)
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(err) => return Err(Error::BackendFailure(err.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(audio_buf) => {
                    let spec = *audio_buf.spec();
                    let mut sample_buf =
                        SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
                    sample_buf.copy_interleaved_ref(audio_buf);
                    return Ok(Some(sample_buf.samples().to_vec()));
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    // A corrupt packet is skipped, not fatal.
                    warn!("Skipping undecodable packet in {}: {}", self.path.display(), err);
                    continue;
                }
                Err(err) => return Err(Error::BackendFailure(err.to_string())),
            }
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u32 {
        self.channels
    }

    fn rewind(&mut self) -> Result<()> {
        let seeked = self.reader.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: 0,
                track_id: self.track_id,
            },
        );

        match seeked {
            Ok(_) => {
                self.decoder.reset();
                Ok(())
            }
            Err(err) => {
                debug!(
                    "Seek unsupported for {} ({}), reopening",
                    self.path.display(),
                    err
                );
                let reopened = SymphoniaDecoder::open(&self.path)
                    .map_err(|e| Error::BackendFailure(e.to_string()))?;
                *self = reopened;
                Ok(())
            }
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tone(path: &Path, frames: u32, channels: u16, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let value = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn drain(decoder: &mut SymphoniaDecoder) -> Vec<f32> {
        let mut all = Vec::new();
        while let Some(block) = decoder.decode_next().unwrap() {
            all.extend(block);
        }
        all
    }

    #[test]
    fn decodes_whole_wav_clip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("number_one.wav");
        write_tone(&path, 800, 1, 8000);

        let mut decoder = SymphoniaDecoder::open(&path).unwrap();
        assert_eq!(decoder.sample_rate(), 8000);
        assert_eq!(decoder.channels(), 1);
        assert_eq!(decoder.duration(), Some(0.1));

        let samples = drain(&mut decoder);
        assert_eq!(samples.len(), 800);
        assert!(decoder.decode_next().unwrap().is_none());
    }

    #[test]
    fn rewind_restarts_from_first_frame() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("family_father.wav");
        write_tone(&path, 1200, 2, 16000);

        let mut decoder = SymphoniaDecoder::open(&path).unwrap();
        let first_pass = drain(&mut decoder);

        decoder.rewind().unwrap();
        let second_pass = drain(&mut decoder);

        assert_eq!(first_pass.len(), 2400);
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let result = SymphoniaDecoder::open(dir.path().join("nope.wav"));
        assert!(matches!(result, Err(Error::ResourceUnavailable(_))));
    }

    #[test]
    fn garbage_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let result = SymphoniaDecoder::open(&path);
        assert!(matches!(result, Err(Error::ResourceUnavailable(_))));
    }
}
