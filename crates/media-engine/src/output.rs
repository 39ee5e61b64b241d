// crates/media-engine/src/output.rs
// cpal output for one decoded verse

use crate::decoder::DecodedTrack;
use crate::error::{PlaybackError, PlaybackResult};
use crate::resampler::{choose_output, conform, ConfigRange, StreamShape};
use crate::resource::ResourceListener;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

/// State shared between the resource and the audio callback
#[derive(Debug)]
pub(crate) struct PlayHead {
    /// Next frame to play
    cursor: AtomicUsize,
    playing: AtomicBool,
    volume: AtomicU32,
    finished: AtomicBool,
}

impl PlayHead {
    pub(crate) fn new(volume: f32) -> Self {
        Self {
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            volume: AtomicU32::new(volume.to_bits()),
            finished: AtomicBool::new(false),
        }
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub(crate) fn seek(&self, frame: usize) {
        self.cursor.store(frame, Ordering::Release);
        self.finished.store(false, Ordering::Release);
    }

    pub(crate) fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub(crate) fn set_volume(&self, volume: f32) {
        self.volume.store(volume.to_bits(), Ordering::Release);
    }

    pub(crate) fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Acquire))
    }

    /// Copies the next frames of `track` into `out`, returns true when the
    /// end of the track was reached for the first time
    pub(crate) fn fill(&self, track: &DecodedTrack, out: &mut [f32]) -> bool {
        if !self.is_playing() || track.channels == 0 {
            out.fill(0.0);
            return false;
        }

        let channels = usize::from(track.channels);
        let total = track.frames();
        let start = self.cursor();
        let wanted = out.len() / channels;
        let available = total.saturating_sub(start).min(wanted);

        let volume = self.volume();
        let source = &track.samples[start * channels..(start + available) * channels];
        for (sample, value) in out.iter_mut().zip(source) {
            *sample = value * volume;
        }
        out[available * channels..].fill(0.0);

        // A concurrent seek wins over this advance
        let _ = self.cursor.compare_exchange(
            start,
            start + available,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        start + available >= total && !self.finished.swap(true, Ordering::AcqRel)
    }
}

/// Messages handled by the output thread
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OutputMessage {
    Finished,
    Failed(String),
    Stop,
}

/// Output device by name, or the system default
pub fn open_device(name: Option<&str>) -> PlaybackResult<Device> {
    let host = cpal::default_host();

    if let Some(wanted) = name {
        let devices = host
            .output_devices()
            .map_err(|e| rejected(format!("Failed to enumerate devices: {}", e)))?;
        for device in devices {
            if device.name().map(|n| n == wanted).unwrap_or(false) {
                return Ok(device);
            }
        }
        log::warn!("Output device '{}' not found, using the default", wanted);
    }

    host.default_output_device()
        .ok_or_else(|| rejected("No output device available"))
}

/// Names of the available output devices
pub fn output_device_names() -> Vec<String> {
    let host = cpal::default_host();
    match host.output_devices() {
        Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
        Err(e) => {
            log::warn!("Failed to enumerate devices: {}", e);
            Vec::new()
        }
    }
}

/// What the device offers, restricted to `f32` when it has any
fn supported_ranges(device: &Device) -> PlaybackResult<Vec<ConfigRange>> {
    let configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| rejected(format!("Failed to get device configs: {}", e)))?
        .collect();

    let has_f32 = configs.iter().any(|c| c.sample_format() == SampleFormat::F32);
    Ok(configs
        .iter()
        .filter(|c| !has_f32 || c.sample_format() == SampleFormat::F32)
        .map(|c| ConfigRange {
            channels: c.channels(),
            min_rate: c.min_sample_rate().0,
            max_rate: c.max_sample_rate().0,
        })
        .collect())
}

/// Converts `track` to a configuration the device supports and starts a
/// stream for it
fn build_stream(
    device: &Device,
    track: DecodedTrack,
    head: Arc<PlayHead>,
    events: Sender<OutputMessage>,
) -> PlaybackResult<(Stream, Arc<DecodedTrack>)> {
    let wanted = StreamShape {
        channels: track.channels,
        sample_rate: track.sample_rate,
    };
    let shape = choose_output(&supported_ranges(device)?, wanted)
        .ok_or_else(|| rejected("Device has no usable output configuration"))?;
    if shape != wanted {
        log::debug!(
            "Converting {} Hz/{} ch to {} Hz/{} ch for output",
            wanted.sample_rate,
            wanted.channels,
            shape.sample_rate,
            shape.channels
        );
    }
    let track = Arc::new(conform(track, shape)?);

    let config = StreamConfig {
        channels: shape.channels,
        sample_rate: SampleRate(shape.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let errors = events.clone();
    let playing = Arc::clone(&track);
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if head.fill(&playing, data) {
                    let _ = events.send(OutputMessage::Finished);
                }
            },
            move |err| {
                let _ = errors.send(OutputMessage::Failed(err.to_string()));
            },
            None,
        )
        .map_err(|e| rejected(format!("Failed to build stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| rejected(format!("Failed to start stream: {}", e)))?;
    Ok((stream, track))
}

/// A running output thread and the layout of what it plays
pub(crate) struct OutputHandle {
    pub control: Sender<OutputMessage>,
    pub thread: thread::JoinHandle<()>,
    /// Frame count and rate after conversion to the device's configuration
    pub frames: usize,
    pub sample_rate: u32,
}

/// Opens the device and keeps the stream alive on its own thread
///
/// Resolves once the stream is running (silent until the head plays).
pub(crate) async fn spawn_output_thread(
    device_name: Option<String>,
    track: DecodedTrack,
    head: Arc<PlayHead>,
    listener: ResourceListener,
) -> PlaybackResult<OutputHandle> {
    let (control, messages) = crossbeam_channel::unbounded();
    let (ready_tx, ready_rx) = oneshot::channel();
    let events = control.clone();

    let handle = thread::Builder::new()
        .name("tilawah-output".to_string())
        .spawn(move || {
            let stream = open_device(device_name.as_deref())
                .and_then(|device| build_stream(&device, track, head, events));
            match stream {
                Ok((stream, track)) => {
                    let _ = ready_tx.send(Ok((track.frames(), track.sample_rate)));
                    output_loop(&messages, &listener);
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            }
        })
        .map_err(|e| rejected(format!("Failed to spawn output thread: {}", e)))?;

    match ready_rx.await {
        Ok(Ok((frames, sample_rate))) => Ok(OutputHandle {
            control,
            thread: handle,
            frames,
            sample_rate,
        }),
        Ok(Err(e)) => {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
            Err(e)
        }
        Err(_) => Err(rejected("Output thread exited during setup")),
    }
}

fn output_loop(messages: &Receiver<OutputMessage>, listener: &ResourceListener) {
    while let Ok(message) = messages.recv() {
        match message {
            OutputMessage::Finished => listener.ended(),
            OutputMessage::Failed(reason) => {
                log::error!("Audio output error: {}", reason);
                listener.failed(reason);
            }
            OutputMessage::Stop => break,
        }
    }
}

fn rejected(message: impl Into<String>) -> PlaybackError {
    PlaybackError::PlaybackRejected(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> DecodedTrack {
        DecodedTrack {
            samples: vec![0.5; 8],
            sample_rate: 4,
            channels: 2,
        }
    }

    #[test]
    fn test_paused_head_outputs_silence() {
        let head = PlayHead::new(1.0);
        let mut out = [1.0; 4];
        assert!(!head.fill(&track(), &mut out));
        assert_eq!(out, [0.0; 4]);
        assert_eq!(head.cursor(), 0);
    }

    #[test]
    fn test_fill_applies_volume_and_advances() {
        let head = PlayHead::new(0.5);
        head.set_playing(true);
        let mut out = [0.0; 4];
        assert!(!head.fill(&track(), &mut out));
        assert_eq!(out, [0.25; 4]);
        assert_eq!(head.cursor(), 2);
    }

    #[test]
    fn test_end_reported_once() {
        let head = PlayHead::new(1.0);
        head.set_playing(true);
        let mut out = [0.0; 6];
        assert!(!head.fill(&track(), &mut out));
        assert!(head.fill(&track(), &mut out));
        assert_eq!(out, [0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);
        assert!(!head.fill(&track(), &mut out));
    }

    #[test]
    fn test_seek_rearms_end() {
        let head = PlayHead::new(1.0);
        head.set_playing(true);
        let mut out = [0.0; 8];
        assert!(head.fill(&track(), &mut out));
        head.seek(0);
        assert_eq!(head.cursor(), 0);
        assert!(head.fill(&track(), &mut out));
    }

    #[test]
    fn test_output_loop_forwards_until_stop() {
        use crate::resource::ResourceEvent;
        use std::sync::Mutex;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = ResourceListener::new(3, Arc::new(move |_, e| sink.lock().unwrap().push(e)));
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(OutputMessage::Finished).unwrap();
        tx.send(OutputMessage::Failed("xrun".to_string())).unwrap();
        tx.send(OutputMessage::Stop).unwrap();
        tx.send(OutputMessage::Finished).unwrap();

        output_loop(&rx, &listener);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![ResourceEvent::Ended, ResourceEvent::Failed("xrun".to_string())]
        );
    }
}
