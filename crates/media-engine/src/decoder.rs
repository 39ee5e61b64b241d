// FILE: crates/media-engine/src/decoder.rs

use crate::error::{PlaybackError, PlaybackResult};
use std::io::Cursor;
use symphonia::core::audio::{AudioBufferRef, SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use std::time::Duration;

/// Packet-by-packet decoder over an in-memory file
pub struct AudioDecoder {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: SignalSpec,
}

/// A fully decoded verse, interleaved `f32` samples
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedTrack {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.sample_rate)
    }
}

pub(crate) fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / f64::from(sample_rate))
}

pub(crate) fn duration_to_frames(position: Duration, sample_rate: u32) -> usize {
    (position.as_secs_f64() * f64::from(sample_rate)) as usize
}

impl AudioDecoder {
    /// Probes `bytes`, using `extension` as a format hint when known
    pub fn from_bytes(bytes: Vec<u8>, extension: Option<&str>) -> PlaybackResult<Self> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| decode_error(format!("Failed to probe format: {}", e)))?;

        let reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| decode_error("No audio track found"))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| decode_error(format!("Failed to create decoder: {}", e)))?;

        let spec = SignalSpec::new(
            codec_params.sample_rate.unwrap_or(44100),
            codec_params.channels.unwrap_or_default(),
        );

        Ok(Self {
            reader,
            decoder,
            track_id,
            spec,
        })
    }

    /// Next packet as interleaved samples, `None` at end of stream
    pub fn decode_next(&mut self) -> PlaybackResult<Option<(Vec<f32>, SignalSpec)>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(decode_error(format!("Failed to read packet: {}", e)));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Decode error, skipping packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(decode_error(format!("Failed to decode packet: {}", e)));
                }
            };

            let spec = *decoded.spec();
            return Ok(Some((interleave(decoded), spec)));
        }
    }

    /// Decodes the remainder of the stream in one go
    pub fn decode_all(mut self) -> PlaybackResult<DecodedTrack> {
        let mut samples = Vec::new();
        let mut spec = self.spec;

        while let Some((chunk, chunk_spec)) = self.decode_next()? {
            spec = chunk_spec;
            samples.extend_from_slice(&chunk);
        }

        let channels = spec.channels.count() as u16;
        if channels == 0 || samples.is_empty() {
            return Err(decode_error("Track contains no audio"));
        }

        Ok(DecodedTrack {
            samples,
            sample_rate: spec.rate,
            channels,
        })
    }

    pub fn spec(&self) -> &SignalSpec {
        &self.spec
    }
}

fn interleave(decoded: AudioBufferRef<'_>) -> Vec<f32> {
    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
    buffer.copy_interleaved_ref(decoded);
    buffer.samples().to_vec()
}

fn decode_error(message: impl Into<String>) -> PlaybackError {
    PlaybackError::PlaybackRuntimeError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_rejected() {
        let result = AudioDecoder::from_bytes(b"definitely not audio".to_vec(), Some("mp3"));
        assert!(matches!(
            result,
            Err(PlaybackError::PlaybackRuntimeError(_))
        ));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(AudioDecoder::from_bytes(Vec::new(), None).is_err());
    }

    #[test]
    fn test_track_duration() {
        let track = DecodedTrack {
            samples: vec![0.0; 44_100 * 2 * 3],
            sample_rate: 44_100,
            channels: 2,
        };
        assert_eq!(track.frames(), 132_300);
        assert_eq!(track.duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_frame_conversions() {
        assert_eq!(duration_to_frames(Duration::from_millis(500), 48_000), 24_000);
        assert_eq!(frames_to_duration(24_000, 48_000), Duration::from_millis(500));
        assert_eq!(frames_to_duration(10, 0), Duration::ZERO);
    }
}
