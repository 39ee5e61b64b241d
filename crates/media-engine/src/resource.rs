//! Capability interface for one playable audio handle
//!
//! The session drives every platform through these two traits. A backend
//! turns an [`AudioLocator`] into an [`AudioResource`]; the resource reports
//! natural end and asynchronous failures through the [`ResourceListener`] it
//! was handed at acquisition.

use crate::error::PlaybackResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tilawah_core::AudioLocator;

/// Notifications a resource sends back to its session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// Playback reached the end of the track
    Ended,
    /// Decode, network or device failure after acquisition
    Failed(String),
}

type EventSink = Arc<dyn Fn(u64, ResourceEvent) + Send + Sync>;

/// Delivery channel from a resource to the session that requested it
///
/// Once detached, a listener silently drops everything. The session detaches
/// the listener of a resource before stopping it, so late events from a
/// replaced track never reach the new one.
#[derive(Clone)]
pub struct ResourceListener {
    generation: u64,
    detached: Arc<AtomicBool>,
    sink: EventSink,
}

impl ResourceListener {
    pub(crate) fn new(generation: u64, sink: EventSink) -> Self {
        Self {
            generation,
            detached: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    /// A listener that never delivers, for driving a resource by hand
    pub fn inert() -> Self {
        let listener = Self::new(0, Arc::new(|_, _| {}));
        listener.detach();
        listener
    }

    /// Request generation this listener belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports natural end of the track
    pub fn ended(&self) {
        self.emit(ResourceEvent::Ended);
    }

    /// Reports a failure after acquisition
    pub fn failed(&self, reason: impl Into<String>) {
        self.emit(ResourceEvent::Failed(reason.into()));
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    fn emit(&self, event: ResourceEvent) {
        if self.is_detached() {
            log::debug!(
                "Dropping {:?} from detached resource (generation {})",
                event,
                self.generation
            );
            return;
        }
        (self.sink)(self.generation, event);
    }
}

impl fmt::Debug for ResourceListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceListener")
            .field("generation", &self.generation)
            .field("detached", &self.is_detached())
            .finish()
    }
}

/// One acquired audio handle
pub trait AudioResource: Send {
    /// Begins or resumes output
    ///
    /// A platform that refuses to start audio (autoplay policy, no output
    /// device) returns [`crate::PlaybackError::PlaybackRejected`].
    fn start(&mut self) -> PlaybackResult<()>;

    /// Pauses in place
    fn pause(&mut self);

    /// Silences and releases the handle; must be idempotent
    fn stop(&mut self);

    /// Moves the play head
    fn seek(&mut self, position: Duration) -> PlaybackResult<()>;

    /// Applies an already clamped level
    fn set_volume(&mut self, volume: f32);

    /// Elapsed playback time of the current track
    fn elapsed(&self) -> Duration;

    /// True while a seek is still settling
    fn is_seeking(&self) -> bool {
        false
    }
}

/// Turns locators into resources
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Fetches, decodes and prepares a resource without starting it
    ///
    /// The resource must be initialised at `volume`. Events after this call
    /// returns go through `listener`.
    async fn acquire(
        &self,
        locator: AudioLocator,
        volume: f32,
        listener: ResourceListener,
    ) -> PlaybackResult<Box<dyn AudioResource>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_listener(generation: u64) -> (ResourceListener, Arc<Mutex<Vec<(u64, ResourceEvent)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let listener = ResourceListener::new(
            generation,
            Arc::new(move |g, e| sink_seen.lock().unwrap().push((g, e))),
        );
        (listener, seen)
    }

    #[test]
    fn test_listener_tags_generation() {
        let (listener, seen) = recording_listener(7);
        listener.ended();
        listener.failed("boom");
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], (7, ResourceEvent::Ended));
        assert_eq!(seen[1], (7, ResourceEvent::Failed("boom".to_string())));
    }

    #[test]
    fn test_detached_listener_is_silent() {
        let (listener, seen) = recording_listener(1);
        let clone = listener.clone();
        listener.detach();
        clone.ended();
        assert!(clone.is_detached());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_inert_listener() {
        let listener = ResourceListener::inert();
        assert!(listener.is_detached());
        listener.ended();
    }
}
