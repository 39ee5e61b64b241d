//! Audio backend for real output devices
//!
//! Each verse is fetched whole, decoded on the blocking pool and handed to a
//! dedicated output thread that owns the cpal stream.

use crate::decoder::{duration_to_frames, frames_to_duration, AudioDecoder, DecodedTrack};
use crate::error::{PlaybackError, PlaybackResult};
use crate::output::{spawn_output_thread, OutputHandle, OutputMessage, PlayHead};
use crate::resource::{AudioBackend, AudioResource, ResourceListener};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tilawah_core::AudioLocator;

/// Fetches verse audio over HTTP (or from disk) and plays it through cpal
#[derive(Debug, Clone, Default)]
pub struct DeviceBackend {
    client: reqwest::Client,
    output_device: Option<String>,
}

impl DeviceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            output_device: None,
        }
    }

    /// Plays through the named device instead of the system default
    pub fn with_output_device(mut self, name: impl Into<String>) -> Self {
        self.output_device = Some(name.into());
        self
    }

    async fn fetch(&self, locator: &AudioLocator) -> PlaybackResult<Vec<u8>> {
        let url = locator.as_str();

        if url.starts_with("http://") || url.starts_with("https://") {
            log::debug!("Fetching {}", url);
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| runtime(format!("Failed to fetch {}: {}", url, e)))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| runtime(format!("Failed to read {}: {}", url, e)))?;
            return Ok(bytes.to_vec());
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .map_err(|e| runtime(format!("Failed to open {}: {}", path, e)))
    }
}

#[async_trait]
impl AudioBackend for DeviceBackend {
    async fn acquire(
        &self,
        locator: AudioLocator,
        volume: f32,
        listener: ResourceListener,
    ) -> PlaybackResult<Box<dyn AudioResource>> {
        let bytes = self.fetch(&locator).await?;

        let extension = locator.extension().map(str::to_owned);
        let track = tokio::task::spawn_blocking(move || {
            AudioDecoder::from_bytes(bytes, extension.as_deref())?.decode_all()
        })
        .await
        .map_err(|e| runtime(format!("Decoder task failed: {}", e)))??;

        log::debug!(
            "Decoded {} ({:?}, {} Hz, {} channels)",
            locator,
            track.duration(),
            track.sample_rate,
            track.channels
        );

        let resource =
            DeviceResource::open(track, self.output_device.clone(), volume, listener).await?;
        Ok(Box::new(resource))
    }
}

/// One decoded verse attached to an output stream
pub struct DeviceResource {
    head: Arc<PlayHead>,
    frames: usize,
    sample_rate: u32,
    control: Sender<OutputMessage>,
    thread: Option<thread::JoinHandle<()>>,
}

impl DeviceResource {
    async fn open(
        track: DecodedTrack,
        output_device: Option<String>,
        volume: f32,
        listener: ResourceListener,
    ) -> PlaybackResult<Self> {
        let head = Arc::new(PlayHead::new(volume));
        let OutputHandle {
            control,
            thread,
            frames,
            sample_rate,
        } = spawn_output_thread(output_device, track, Arc::clone(&head), listener).await?;

        Ok(Self {
            head,
            frames,
            sample_rate,
            control,
            thread: Some(thread),
        })
    }
}

impl AudioResource for DeviceResource {
    fn start(&mut self) -> PlaybackResult<()> {
        match &self.thread {
            Some(thread) if !thread.is_finished() => {
                self.head.set_playing(true);
                Ok(())
            }
            _ => Err(PlaybackError::PlaybackRejected(
                "Output stream is closed".to_string(),
            )),
        }
    }

    fn pause(&mut self) {
        self.head.set_playing(false);
    }

    fn stop(&mut self) {
        self.head.set_playing(false);
        if let Some(thread) = self.thread.take() {
            let _ = self.control.send(OutputMessage::Stop);
            join_output(thread);
        }
    }

    fn seek(&mut self, position: Duration) -> PlaybackResult<()> {
        let frame = duration_to_frames(position, self.sample_rate).min(self.frames);
        self.head.seek(frame);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.head.set_volume(volume);
    }

    fn elapsed(&self) -> Duration {
        frames_to_duration(self.head.cursor().min(self.frames), self.sample_rate)
    }
}

impl Drop for DeviceResource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Joins the output thread off the async workers when called from one
fn join_output(thread: thread::JoinHandle<()>) {
    let join = move || {
        if thread.join().is_err() {
            log::warn!("Output thread panicked");
        }
    };
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(join);
        }
        Err(_) => join(),
    }
}

fn runtime(message: String) -> PlaybackError {
    PlaybackError::PlaybackRuntimeError(message)
}
