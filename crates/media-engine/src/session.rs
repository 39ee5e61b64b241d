//! Sequential verse playback session
//!
//! [`PlaybackSession`] is a cheap, cloneable handle. The state lives in a
//! single actor task that processes one event at a time: caller commands,
//! acquisition results, resource notifications, lookup results and the
//! auto-advance timer. Every asynchronous piece of work is tagged with the
//! request generation that spawned it and is discarded on arrival if a newer
//! transition has happened since.

use crate::error::{PlaybackError, PlaybackResult};
use crate::navigation::{self, NextStep, PreviousStep};
use crate::resource::{AudioBackend, AudioResource, ResourceEvent, ResourceListener};
use crate::scheduler::ScheduledTask;
use crate::state::{SessionSnapshot, SessionState};
use crate::volume::{VolumeControl, DEFAULT_UNMUTE_VOLUME};
use std::sync::Arc;
use std::time::Duration;
use tilawah_core::{ContentProvider, ContentResult, Position, PreferenceStore};
use tokio::sync::{mpsc, oneshot, watch};

/// Pause between a track ending and the next one being requested
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(300);

/// Elapsed time after which "previous" restarts the current verse
pub const DEFAULT_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// Called with the position of every request whose audio location resolved
pub type PositionHook = Arc<dyn Fn(Position) + Send + Sync>;

/// Tunables of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub initial_volume: f32,
    /// Level restored by unmute when no audible level is remembered
    pub unmute_volume: f32,
    pub advance_delay: Duration,
    pub restart_threshold: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_volume: DEFAULT_UNMUTE_VOLUME,
            unmute_volume: DEFAULT_UNMUTE_VOLUME,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            restart_threshold: DEFAULT_RESTART_THRESHOLD,
        }
    }
}

type Reply = oneshot::Sender<PlaybackResult<()>>;

enum Command {
    PlayAt { chapter: u32, verse: u32, reply: Reply },
    Pause(Reply),
    Resume(Reply),
    Stop(Reply),
    Next(Reply),
    Previous(Reply),
    SetVolume(f32, oneshot::Sender<f32>),
    ToggleMute(oneshot::Sender<f32>),
    Elapsed(oneshot::Sender<Option<Duration>>),
}

#[derive(Debug, Clone, Copy)]
enum Lookup {
    /// Verse count of the current chapter, to advance from `from`
    Next { from: Position },
    /// Verse count of `chapter`, to land on its last verse
    LastVerseOf { chapter: u16 },
}

enum Internal {
    Acquired {
        generation: u64,
        result: PlaybackResult<Box<dyn AudioResource>>,
    },
    Resource {
        generation: u64,
        event: ResourceEvent,
    },
    AdvanceDue {
        generation: u64,
    },
    Resolved {
        generation: u64,
        lookup: Lookup,
        result: ContentResult<u16>,
    },
}

/// Assembles a session from its collaborators
pub struct SessionBuilder {
    content: Arc<dyn ContentProvider>,
    preferences: Arc<dyn PreferenceStore>,
    backend: Arc<dyn AudioBackend>,
    config: SessionConfig,
    hook: Option<PositionHook>,
}

impl SessionBuilder {
    pub fn new(
        content: Arc<dyn ContentProvider>,
        preferences: Arc<dyn PreferenceStore>,
        backend: Arc<dyn AudioBackend>,
    ) -> Self {
        Self {
            content,
            preferences,
            backend,
            config: SessionConfig::default(),
            hook: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers the presentation hook
    ///
    /// Runs on the session task, so it must return quickly.
    pub fn on_position_loaded<F>(mut self, hook: F) -> Self
    where
        F: Fn(Position) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Starts the session task on the current tokio runtime
    pub fn spawn(self) -> PlaybackSession {
        let volume = VolumeControl::with_unmute_fallback(
            self.config.initial_volume,
            self.config.unmute_volume,
        );
        let snapshot = SessionSnapshot::new(volume.level());
        let (published, snapshot_rx) = watch::channel(snapshot.clone());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let actor = SessionActor {
            content: self.content,
            preferences: self.preferences,
            backend: self.backend,
            hook: self.hook,
            config: self.config,
            internal: internal_tx,
            published,
            snapshot,
            volume,
            generation: 0,
            active: None,
            listener: None,
            pending: None,
            advance: None,
        };
        tokio::spawn(actor.run(command_rx, internal_rx));

        PlaybackSession {
            commands: command_tx,
            snapshot: snapshot_rx,
        }
    }
}

/// Handle to a running playback session
///
/// The session task stops once every handle has been dropped.
#[derive(Clone)]
pub struct PlaybackSession {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl PlaybackSession {
    pub fn builder(
        content: Arc<dyn ContentProvider>,
        preferences: Arc<dyn PreferenceStore>,
        backend: Arc<dyn AudioBackend>,
    ) -> SessionBuilder {
        SessionBuilder::new(content, preferences, backend)
    }

    /// Plays a verse, resolving once it is audible or the request failed
    ///
    /// Returns [`PlaybackError::Superseded`] when another transition
    /// overtook this one before it settled.
    pub async fn play_at(&self, chapter: u32, verse: u32) -> PlaybackResult<()> {
        self.request(|reply| Command::PlayAt {
            chapter,
            verse,
            reply,
        })
        .await?
    }

    pub async fn play_position(&self, position: Position) -> PlaybackResult<()> {
        self.play_at(u32::from(position.chapter()), u32::from(position.verse()))
            .await
    }

    /// Pauses when playing, otherwise does nothing
    pub async fn pause(&self) -> PlaybackResult<()> {
        self.request(Command::Pause).await?
    }

    /// Resumes when paused, otherwise does nothing
    pub async fn resume(&self) -> PlaybackResult<()> {
        self.request(Command::Resume).await?
    }

    pub async fn stop(&self) -> PlaybackResult<()> {
        self.request(Command::Stop).await?
    }

    pub async fn play_next(&self) -> PlaybackResult<()> {
        self.request(Command::Next).await?
    }

    pub async fn play_previous(&self) -> PlaybackResult<()> {
        self.request(Command::Previous).await?
    }

    /// Sets the volume, returns the clamped level that was applied
    pub async fn set_volume(&self, volume: f32) -> PlaybackResult<f32> {
        self.request(|reply| Command::SetVolume(volume, reply)).await
    }

    /// Mutes or unmutes, returns the new level
    pub async fn toggle_mute(&self) -> PlaybackResult<f32> {
        self.request(Command::ToggleMute).await
    }

    /// Elapsed time of the active resource, if any
    pub async fn elapsed(&self) -> PlaybackResult<Option<Duration>> {
        self.request(Command::Elapsed).await
    }

    /// Current state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> PlaybackResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .map_err(|_| PlaybackError::SessionClosed)?;
        response.await.map_err(|_| PlaybackError::SessionClosed)
    }
}

struct SessionActor {
    content: Arc<dyn ContentProvider>,
    preferences: Arc<dyn PreferenceStore>,
    backend: Arc<dyn AudioBackend>,
    hook: Option<PositionHook>,
    config: SessionConfig,
    internal: mpsc::UnboundedSender<Internal>,
    published: watch::Sender<SessionSnapshot>,
    snapshot: SessionSnapshot,
    volume: VolumeControl,
    /// Bumped by every transition; async results carry the value they started with
    generation: u64,
    active: Option<Box<dyn AudioResource>>,
    /// Listener of the resource that is loading or loaded
    listener: Option<ResourceListener>,
    /// Caller waiting for the in-flight transition
    pending: Option<Reply>,
    advance: Option<ScheduledTask>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(event) = internal.recv() => self.handle_internal(event),
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }

        log::debug!("All session handles dropped, shutting down");
        self.release();
        self.snapshot.state = SessionState::Idle;
        self.snapshot.is_loading = false;
        self.publish();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::PlayAt {
                chapter,
                verse,
                reply,
            } => self.play_at(chapter, verse, reply),
            Command::Pause(reply) => {
                self.pause();
                let _ = reply.send(Ok(()));
            }
            Command::Resume(reply) => self.resume(reply),
            Command::Stop(reply) => {
                self.stop();
                let _ = reply.send(Ok(()));
            }
            Command::Next(reply) => self.advance_next(Some(reply)),
            Command::Previous(reply) => self.go_previous(reply),
            Command::SetVolume(volume, reply) => {
                let level = self.volume.set(volume);
                self.apply_volume(level);
                let _ = reply.send(level);
            }
            Command::ToggleMute(reply) => {
                let level = self.volume.toggle_mute();
                self.apply_volume(level);
                let _ = reply.send(level);
            }
            Command::Elapsed(reply) => {
                let _ = reply.send(self.active.as_ref().map(|r| r.elapsed()));
            }
        }
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::Acquired { generation, result } => self.on_acquired(generation, result),
            Internal::Resource { generation, event } => self.on_resource_event(generation, event),
            Internal::AdvanceDue { generation } => {
                if generation != self.generation || self.advance.take().is_none() {
                    log::debug!("Ignoring stale auto-advance (generation {})", generation);
                    return;
                }
                self.advance_next(None);
            }
            Internal::Resolved {
                generation,
                lookup,
                result,
            } => self.on_resolved(generation, lookup, result),
        }
    }

    fn play_at(&mut self, chapter: u32, verse: u32, reply: Reply) {
        match Position::new(chapter, verse) {
            Ok(position) => self.begin_transition(position, Some(reply)),
            Err(err) => {
                log::error!("Invalid position {}:{}: {}", chapter, verse, err);
                self.snapshot.is_loading = false;
                self.publish();
                let _ = reply.send(Err(err.into()));
            }
        }
    }

    /// Replaces whatever is playing with `position`
    fn begin_transition(&mut self, position: Position, reply: Option<Reply>) {
        self.release();
        self.pending = reply;

        log::info!("Loading verse {}", position);
        self.snapshot.state = SessionState::Loading;
        self.snapshot.is_loading = true;
        self.snapshot.position = Some(position);
        self.snapshot.error = None;
        self.publish();

        let reciter = self.preferences.reciter_id();
        let locator = match self.content.audio_locator(position, &reciter) {
            Ok(locator) => locator,
            Err(err) => {
                log::error!("No audio for {} with reciter {}: {}", position, reciter, err);
                self.abort_lookup(err.into());
                return;
            }
        };
        log::debug!("Audio for {} ({}): {}", position, reciter, locator);

        if let Some(hook) = &self.hook {
            hook(position);
        }

        let generation = self.generation;
        let internal = self.internal.clone();
        let listener = ResourceListener::new(
            generation,
            Arc::new(move |generation, event| {
                let _ = internal.send(Internal::Resource { generation, event });
            }),
        );
        self.listener = Some(listener.clone());

        let backend = Arc::clone(&self.backend);
        let internal = self.internal.clone();
        let volume = self.volume.level();
        tokio::spawn(async move {
            let result = backend.acquire(locator, volume, listener).await;
            let _ = internal.send(Internal::Acquired { generation, result });
        });
    }

    fn on_acquired(&mut self, generation: u64, result: PlaybackResult<Box<dyn AudioResource>>) {
        if generation != self.generation {
            log::debug!("Discarding stale acquisition (generation {})", generation);
            if let Ok(mut resource) = result {
                resource.stop();
            }
            return;
        }

        let mut resource = match result {
            Ok(resource) => resource,
            Err(err) => {
                log::error!("Failed to acquire audio: {}", err);
                self.fail(err);
                return;
            }
        };

        // The level may have moved while the resource was loading
        resource.set_volume(self.volume.level());

        if let Err(err) = resource.start() {
            log::warn!("Audio refused to start: {}", err);
            resource.stop();
            self.fail(err);
            return;
        }

        self.active = Some(resource);
        self.snapshot.state = SessionState::Playing;
        self.snapshot.is_loading = false;
        self.publish();
        if let Some(position) = self.snapshot.position {
            log::info!("Playing verse {}", position);
        }
        self.settle(Ok(()));
    }

    fn on_resource_event(&mut self, generation: u64, event: ResourceEvent) {
        if generation != self.generation {
            log::debug!("Ignoring {:?} from a replaced resource", event);
            return;
        }

        match event {
            ResourceEvent::Ended => {
                if self.snapshot.state != SessionState::Playing {
                    return;
                }
                log::debug!("Track ended, advancing in {:?}", self.config.advance_delay);
                self.snapshot.state = SessionState::Idle;
                self.publish();

                let internal = self.internal.clone();
                self.advance = Some(ScheduledTask::spawn(self.config.advance_delay, move || {
                    let _ = internal.send(Internal::AdvanceDue { generation });
                }));
            }
            ResourceEvent::Failed(reason) => {
                if self.snapshot.state == SessionState::Idle {
                    return;
                }
                log::error!("Playback failed: {}", reason);
                self.fail(PlaybackError::PlaybackRuntimeError(reason));
            }
        }
    }

    fn pause(&mut self) {
        if self.snapshot.state != SessionState::Playing {
            return;
        }
        if let Some(resource) = self.active.as_mut() {
            resource.pause();
            self.snapshot.state = SessionState::Paused;
            self.publish();
        }
    }

    fn resume(&mut self, reply: Reply) {
        if self.snapshot.state != SessionState::Paused {
            let _ = reply.send(Ok(()));
            return;
        }
        let outcome = self.restart_active(false);
        let _ = reply.send(outcome);
    }

    fn stop(&mut self) {
        self.release();
        self.snapshot.state = SessionState::Idle;
        self.snapshot.is_loading = false;
        self.snapshot.position = None;
        self.snapshot.error = None;
        self.publish();
    }

    /// Next-position algorithm
    fn advance_next(&mut self, reply: Option<Reply>) {
        let Some(current) = self.snapshot.position else {
            log::debug!("Nothing to advance from, stopping");
            self.stop();
            if let Some(reply) = reply {
                let _ = reply.send(Ok(()));
            }
            return;
        };
        self.begin_lookup(Lookup::Next { from: current }, current.chapter(), reply);
    }

    /// Previous-position algorithm
    fn go_previous(&mut self, reply: Reply) {
        let Some(current) = self.snapshot.position else {
            let _ = reply.send(Ok(()));
            return;
        };

        // While a lookup is in flight the active resource is on its way out
        if let Some(resource) = self.active.as_ref().filter(|_| !self.snapshot.is_loading) {
            if resource.elapsed() > self.config.restart_threshold && !resource.is_seeking() {
                log::debug!("Restarting {} instead of going back", current);
                let outcome = self.restart_active(true);
                let _ = reply.send(outcome);
                return;
            }
        }

        match navigation::previous_step(current) {
            PreviousStep::Play(target) => self.begin_transition(target, Some(reply)),
            PreviousStep::LastVerseOf(chapter) => {
                self.begin_lookup(Lookup::LastVerseOf { chapter }, chapter, Some(reply))
            }
            PreviousStep::StartOfCollection => {
                let outcome = if self.active.is_some() {
                    self.restart_active(true)
                } else {
                    Ok(())
                };
                let _ = reply.send(outcome);
            }
        }
    }

    /// Starts the active resource again, from zero when `rewind` is set
    fn restart_active(&mut self, rewind: bool) -> PlaybackResult<()> {
        if let Some(task) = self.advance.take() {
            task.cancel();
        }
        let Some(resource) = self.active.as_mut() else {
            return Ok(());
        };

        if rewind {
            if let Err(err) = resource.seek(Duration::ZERO) {
                self.fail(err.clone());
                return Err(err);
            }
        }

        if self.snapshot.state != SessionState::Playing {
            if let Err(err) = resource.start() {
                self.fail(err.clone());
                return Err(err);
            }
            self.snapshot.state = SessionState::Playing;
            self.publish();
        }
        Ok(())
    }

    /// Asks the content provider for a verse count without blocking the session
    fn begin_lookup(&mut self, lookup: Lookup, chapter: u16, reply: Option<Reply>) {
        if let Some(task) = self.advance.take() {
            task.cancel();
        }
        // Outstanding acquisitions and events of the current track go stale
        self.generation += 1;
        self.settle(Err(PlaybackError::Superseded));
        self.pending = reply;

        self.snapshot.is_loading = true;
        self.publish();

        let generation = self.generation;
        let content = Arc::clone(&self.content);
        let internal = self.internal.clone();
        tokio::spawn(async move {
            let result = content.chapter_verse_count(chapter).await;
            let _ = internal.send(Internal::Resolved {
                generation,
                lookup,
                result,
            });
        });
    }

    fn on_resolved(&mut self, generation: u64, lookup: Lookup, result: ContentResult<u16>) {
        if generation != self.generation {
            log::debug!("Discarding stale lookup {:?}", lookup);
            return;
        }

        let count = match result {
            Ok(count) => count,
            Err(err) => {
                log::error!("Verse count lookup failed: {}", err);
                self.abort_lookup(err.into());
                return;
            }
        };

        let reply = self.pending.take();
        match lookup {
            Lookup::Next { from } => match navigation::next_step(from, count) {
                NextStep::Play(target) => self.begin_transition(target, reply),
                NextStep::EndOfCollection => {
                    log::info!("Reached the end of the collection");
                    self.stop();
                    if let Some(reply) = reply {
                        let _ = reply.send(Ok(()));
                    }
                }
            },
            Lookup::LastVerseOf { chapter } => {
                match Position::new(u32::from(chapter), u32::from(count)) {
                    Ok(target) => self.begin_transition(target, reply),
                    Err(err) => {
                        self.pending = reply;
                        self.abort_lookup(PlaybackError::ContentLookupFailure(err.to_string()));
                    }
                }
            }
        }
    }

    fn apply_volume(&mut self, level: f32) {
        if let Some(resource) = self.active.as_mut() {
            resource.set_volume(level);
        }
        self.snapshot.volume = level;
        self.publish();
    }

    /// Neutralises the current resource and invalidates outstanding work
    fn release(&mut self) {
        if let Some(task) = self.advance.take() {
            task.cancel();
        }
        if let Some(listener) = self.listener.take() {
            listener.detach();
        }
        if let Some(mut resource) = self.active.take() {
            resource.stop();
        }
        self.generation += 1;
        self.settle(Err(PlaybackError::Superseded));
    }

    /// Ends the transition in `Idle`, keeping the requested position
    fn fail(&mut self, error: PlaybackError) {
        let reply = self.pending.take();
        self.release();
        self.snapshot.state = SessionState::Idle;
        self.snapshot.is_loading = false;
        self.snapshot.error = Some(error.clone());
        self.publish();
        if let Some(reply) = reply {
            let _ = reply.send(Err(error));
        }
    }

    /// Ends the transition in `Idle` with no position
    fn abort_lookup(&mut self, error: PlaybackError) {
        self.snapshot.position = None;
        self.fail(error);
    }

    fn settle(&mut self, outcome: PlaybackResult<()>) {
        if let Some(reply) = self.pending.take() {
            let _ = reply.send(outcome);
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.snapshot.clone());
    }
}
