//! In-memory doubles for driving a session without network or speakers

#![allow(dead_code)]

use async_trait::async_trait;
use media_engine::{
    AudioBackend, AudioResource, PlaybackError, PlaybackResult, PlaybackSession, ResourceListener,
    SessionConfig, SessionSnapshot,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tilawah_core::{
    quran, verse_audio_locator, AudioLocator, ContentError, ContentProvider, ContentResult,
    FixedReciter, Position,
};
use tokio::sync::Notify;

pub const RECITER: &str = "X";
const BASE: &str = "fake://audio";

pub fn pos(chapter: u32, verse: u32) -> Position {
    Position::new(chapter, verse).unwrap()
}

/// Locator the fake content hands out for a verse
pub fn locator(chapter: u32, verse: u32) -> String {
    verse_audio_locator(BASE, pos(chapter, verse), RECITER)
        .unwrap()
        .as_str()
        .to_string()
}

/// Static-table content with per-chapter overrides and failures
#[derive(Default)]
pub struct FakeContent {
    counts: Mutex<HashMap<u16, u16>>,
    failing_chapters: Mutex<HashSet<u16>>,
    pub count_lookups: AtomicUsize,
}

impl FakeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn override_count(&self, chapter: u16, count: u16) {
        self.counts.lock().unwrap().insert(chapter, count);
    }

    pub fn fail_chapter(&self, chapter: u16) {
        self.failing_chapters.lock().unwrap().insert(chapter);
    }
}

#[async_trait]
impl ContentProvider for FakeContent {
    async fn chapter_verse_count(&self, chapter: u16) -> ContentResult<u16> {
        self.count_lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing_chapters.lock().unwrap().contains(&chapter) {
            return Err(ContentError::Unavailable {
                reason: format!("chapter {} is unreachable", chapter),
            });
        }
        if let Some(count) = self.counts.lock().unwrap().get(&chapter) {
            return Ok(*count);
        }
        quran::verses_in(chapter).ok_or_else(|| ContentError::chapter_not_found(u32::from(chapter)))
    }

    fn audio_locator(&self, position: Position, reciter: &str) -> ContentResult<AudioLocator> {
        verse_audio_locator(BASE, position, reciter)
    }
}

/// How the backend treats one locator
#[derive(Clone)]
pub enum Behaviour {
    Ready,
    Fail(String),
    RejectStart,
    /// Acquisition blocks until the notify fires
    Gate(Arc<Notify>),
    /// Blocks like `Gate`, then fails
    GateThenFail(Arc<Notify>, String),
}

/// Everything a fake resource was asked to do
pub struct ResourceLog {
    pub locator: String,
    pub initial_volume: f32,
    pub listener: ResourceListener,
    pub starts: AtomicUsize,
    pub paused: AtomicBool,
    pub stopped: AtomicBool,
    pub volume: Mutex<f32>,
    pub elapsed: Mutex<Duration>,
    pub seeking: AtomicBool,
    pub seeks: Mutex<Vec<Duration>>,
    reject_start: bool,
}

impl ResourceLog {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    pub fn set_elapsed(&self, elapsed: Duration) {
        *self.elapsed.lock().unwrap() = elapsed;
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().unwrap().clone()
    }
}

struct FakeResource {
    log: Arc<ResourceLog>,
}

impl AudioResource for FakeResource {
    fn start(&mut self) -> PlaybackResult<()> {
        if self.log.reject_start {
            return Err(PlaybackError::PlaybackRejected("autoplay blocked".to_string()));
        }
        self.log.starts.fetch_add(1, Ordering::SeqCst);
        self.log.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) {
        self.log.paused.store(true, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.log.stopped.store(true, Ordering::SeqCst);
    }

    fn seek(&mut self, position: Duration) -> PlaybackResult<()> {
        self.log.seeks.lock().unwrap().push(position);
        *self.log.elapsed.lock().unwrap() = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        *self.log.volume.lock().unwrap() = volume;
    }

    fn elapsed(&self) -> Duration {
        *self.log.elapsed.lock().unwrap()
    }

    fn is_seeking(&self) -> bool {
        self.log.seeking.load(Ordering::SeqCst)
    }
}

/// Backend that records every acquisition
#[derive(Default)]
pub struct FakeBackend {
    behaviours: Mutex<HashMap<String, Behaviour>>,
    acquired: Mutex<Vec<Arc<ResourceLog>>>,
    requested: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, chapter: u32, verse: u32, behaviour: Behaviour) {
        self.behaviours
            .lock()
            .unwrap()
            .insert(locator(chapter, verse), behaviour);
    }

    /// Acquisitions requested so far, including those still pending
    pub fn requested(&self) -> usize {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resources handed out so far, in order
    pub fn resources(&self) -> Vec<Arc<ResourceLog>> {
        self.acquired.lock().unwrap().clone()
    }

    pub fn last(&self) -> Arc<ResourceLog> {
        self.resources().last().cloned().expect("no resource acquired")
    }

    pub fn resource_for(&self, chapter: u32, verse: u32) -> Arc<ResourceLog> {
        let wanted = locator(chapter, verse);
        self.resources()
            .into_iter()
            .rev()
            .find(|r| r.locator == wanted)
            .expect("verse never acquired")
    }
}

#[async_trait]
impl AudioBackend for FakeBackend {
    async fn acquire(
        &self,
        locator: AudioLocator,
        volume: f32,
        listener: ResourceListener,
    ) -> PlaybackResult<Box<dyn AudioResource>> {
        self.requested.fetch_add(1, Ordering::SeqCst);
        let behaviour = self
            .behaviours
            .lock()
            .unwrap()
            .get(locator.as_str())
            .cloned()
            .unwrap_or(Behaviour::Ready);

        let reject_start = match behaviour {
            Behaviour::Ready => false,
            Behaviour::RejectStart => true,
            Behaviour::Fail(reason) => return Err(PlaybackError::PlaybackRuntimeError(reason)),
            Behaviour::Gate(gate) => {
                gate.notified().await;
                false
            }
            Behaviour::GateThenFail(gate, reason) => {
                gate.notified().await;
                return Err(PlaybackError::PlaybackRuntimeError(reason));
            }
        };

        let log = Arc::new(ResourceLog {
            locator: locator.as_str().to_string(),
            initial_volume: volume,
            listener,
            starts: AtomicUsize::new(0),
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            volume: Mutex::new(volume),
            elapsed: Mutex::new(Duration::ZERO),
            seeking: AtomicBool::new(false),
            seeks: Mutex::new(Vec::new()),
            reject_start,
        });
        self.acquired.lock().unwrap().push(Arc::clone(&log));
        Ok(Box::new(FakeResource { log }))
    }
}

/// A session over fresh doubles
pub struct Harness {
    pub session: PlaybackSession,
    pub content: Arc<FakeContent>,
    pub backend: Arc<FakeBackend>,
    pub loaded: Arc<Mutex<Vec<Position>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let content = Arc::new(FakeContent::new());
        let backend = Arc::new(FakeBackend::new());
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let hook_loaded = Arc::clone(&loaded);

        let session = PlaybackSession::builder(
            content.clone(),
            Arc::new(FixedReciter::new(RECITER)),
            backend.clone(),
        )
        .config(config)
        .on_position_loaded(move |position| hook_loaded.lock().unwrap().push(position))
        .spawn();

        Self {
            session,
            content,
            backend,
            loaded,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn loaded(&self) -> Vec<Position> {
        self.loaded.lock().unwrap().clone()
    }
}

/// Waits for a published snapshot matching `predicate`
pub async fn wait_for<F>(session: &PlaybackSession, predicate: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let mut updates = session.subscribe();
    let found = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            if predicate(&snapshot) {
                return snapshot;
            }
            if updates.changed().await.is_err() {
                panic!("session closed while waiting");
            }
        }
    })
    .await;
    found.expect("snapshot condition never reached")
}

/// Polls `condition` until it holds
pub async fn eventually<F>(condition: F)
where
    F: Fn() -> bool,
{
    let polled = tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    polled.expect("condition never held");
}

/// Spawns a request so the test can act while it is in flight
pub fn in_background<F>(future: F) -> tokio::task::JoinHandle<PlaybackResult<()>>
where
    F: Future<Output = PlaybackResult<()>> + Send + 'static,
{
    tokio::spawn(future)
}
