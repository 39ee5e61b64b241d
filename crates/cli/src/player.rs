// FILE: crates/cli/src/player.rs
// Interactive verse-by-verse player

use crate::commands::api_client;
use anyhow::{bail, Context, Result};
use console::{style, Key, Term};
use media_engine::{DeviceBackend, PlaybackError, PlaybackSession, SessionConfig, SessionSnapshot};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tilawah_config::{BookmarkStore, Config, ConfigManager, Preferences};
use tilawah_content_sources::{QuranApi, SourceResult};
use tilawah_core::{ChapterDetail, FixedReciter, Position, PreferenceStore};
use tokio::sync::mpsc;
use tokio::time::interval;

/// Continue from the stored last-read position
pub async fn resume(manager: ConfigManager, config: Config) -> Result<()> {
    let store = BookmarkStore::new(manager.bookmarks_path());
    let last = match store.load_or_default().last_read() {
        Some(last) => last,
        None => bail!("Nothing to resume yet, start with 'tilawah play <chapter>'"),
    };

    let position = last.position;
    play(
        manager,
        config,
        u32::from(position.chapter()),
        u32::from(position.verse()),
        None,
    )
    .await
}

/// Start playing at `chapter:verse` and hand the terminal to the player
pub async fn play(
    manager: ConfigManager,
    config: Config,
    chapter: u32,
    verse: u32,
    reciter: Option<String>,
) -> Result<()> {
    let store = Arc::new(BookmarkStore::new(manager.bookmarks_path()));
    let api = Arc::new(api_client(&config));

    let preferences: Arc<dyn PreferenceStore> = match reciter {
        Some(id) => Arc::new(FixedReciter::new(id)),
        None => Arc::new(Preferences::with_config(manager, config.clone())),
    };

    let mut backend = DeviceBackend::new();
    if let Some(name) = &config.player.output_device {
        backend = backend.with_output_device(name.clone());
    }

    let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
    let session = PlaybackSession::builder(api.clone(), preferences, Arc::new(backend))
        .config(session_config(&config))
        .on_position_loaded(move |position| {
            let _ = loaded_tx.send(position);
        })
        .spawn();
    let recorder = tokio::spawn(record_last_read(Arc::clone(&store), loaded_rx));

    log::info!("Starting recitation at {}:{}", chapter, verse);
    request(&session, Action::PlayAt(chapter, verse));

    let term = Term::stdout();
    if term.hide_cursor().is_err() {
        eprintln!("Warning: Failed to hide cursor");
    }

    let result = player_loop(&term, &session, &api, &store, config.player.volume_step_level()).await;

    let _ = term.show_cursor();
    if let Err(e) = session.stop().await {
        log::debug!("Stop on exit: {}", e);
    }
    drop(session);
    if tokio::time::timeout(StdDuration::from_secs(2), recorder).await.is_err() {
        log::warn!("Timed out saving the last-read position");
    }

    result
}

fn session_config(config: &Config) -> SessionConfig {
    SessionConfig {
        initial_volume: config.player.default_volume_level(),
        unmute_volume: config.player.unmute_volume_level(),
        advance_delay: config.player.advance_delay(),
        restart_threshold: config.player.restart_threshold(),
    }
}

async fn record_last_read(store: Arc<BookmarkStore>, mut loaded: mpsc::UnboundedReceiver<Position>) {
    while let Some(position) = loaded.recv().await {
        let store = Arc::clone(&store);
        let saved =
            tokio::task::spawn_blocking(move || store.update(|list| list.set_last_read(position)))
                .await;
        match saved {
            Ok(Ok(())) => log::debug!("Last read: {}", position),
            Ok(Err(e)) => log::warn!("Failed to save last-read position: {}", e),
            Err(e) => log::warn!("Last-read task failed: {}", e),
        }
    }
}

/// What a key press asks the player to do
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    PlayAt(u32, u32),
    Pause,
    Resume,
    Next,
    Previous,
    ToggleMute,
    SetVolume(f32),
    Bookmark(Position),
    Quit,
}

fn action_for(key: &Key, snapshot: &SessionSnapshot, volume_step: f32) -> Option<Action> {
    match key {
        Key::Char(' ') => {
            if snapshot.is_playing() {
                Some(Action::Pause)
            } else if snapshot.is_paused() {
                Some(Action::Resume)
            } else {
                snapshot.position.map(|p| {
                    Action::PlayAt(u32::from(p.chapter()), u32::from(p.verse()))
                })
            }
        }
        Key::Char('n') | Key::ArrowRight => Some(Action::Next),
        Key::Char('p') | Key::ArrowLeft => Some(Action::Previous),
        Key::Char('m') => Some(Action::ToggleMute),
        Key::Char('+') | Key::Char('=') => {
            Some(Action::SetVolume((snapshot.volume + volume_step).min(1.0)))
        }
        Key::Char('-') | Key::Char('_') => {
            Some(Action::SetVolume((snapshot.volume - volume_step).max(0.0)))
        }
        Key::Char('b') => snapshot.position.map(Action::Bookmark),
        Key::Char('q') | Key::Escape => Some(Action::Quit),
        _ => None,
    }
}

/// Sends a transport request without blocking the key loop
fn request(session: &PlaybackSession, action: Action) {
    let session = session.clone();
    tokio::spawn(async move {
        let result = match action {
            Action::PlayAt(chapter, verse) => session.play_at(chapter, verse).await,
            Action::Pause => session.pause().await,
            Action::Resume => session.resume().await,
            Action::Next => session.play_next().await,
            Action::Previous => session.play_previous().await,
            Action::ToggleMute => session.toggle_mute().await.map(|_| ()),
            Action::SetVolume(level) => session.set_volume(level).await.map(|_| ()),
            Action::Bookmark(_) | Action::Quit => Ok(()),
        };
        match result {
            Ok(()) | Err(PlaybackError::Superseded) => {}
            Err(e) => log::debug!("{:?} failed: {}", action, e),
        }
    });
}

/// Forwards key presses from a blocking reader thread
fn spawn_key_reader(term: Term) -> mpsc::UnboundedReceiver<Key> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("tilawah-keys".to_string())
        .spawn(move || {
            while let Ok(key) = term.read_key() {
                if tx.send(key).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        log::error!("Failed to start key reader: {}", e);
    }
    rx
}

/// Chapter text for the verse on screen, fetched once per chapter
#[derive(Default)]
struct ChapterTexts {
    loaded: HashMap<u16, ChapterDetail>,
    requested: HashSet<u16>,
}

impl ChapterTexts {
    fn want(&mut self, chapter: u16, api: &Arc<QuranApi>, tx: &mpsc::UnboundedSender<SourceResult<ChapterDetail>>) {
        if !self.requested.insert(chapter) {
            return;
        }
        let api = Arc::clone(api);
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(api.chapter(chapter).await);
        });
    }
}

async fn player_loop(
    term: &Term,
    session: &PlaybackSession,
    api: &Arc<QuranApi>,
    store: &Arc<BookmarkStore>,
    volume_step: f32,
) -> Result<()> {
    let mut keys = spawn_key_reader(term.clone());
    let mut snapshots = session.subscribe();
    let (text_tx, mut text_rx) = mpsc::unbounded_channel();
    let mut texts = ChapterTexts::default();
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let mut notice: Option<String> = None;
    let mut ticker = interval(StdDuration::from_millis(500));

    loop {
        let snapshot = session.snapshot();
        if let Some(chapter) = snapshot.current_chapter() {
            texts.want(chapter, api, &text_tx);
        }
        let elapsed = session.elapsed().await.ok().flatten();
        draw_player_ui(term, &snapshot, &texts, elapsed, notice.as_deref())?;

        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                match action_for(&key, &snapshot, volume_step) {
                    Some(Action::Quit) => break,
                    Some(Action::Bookmark(position)) => {
                        save_bookmark(store, position, &notice_tx);
                    }
                    Some(action) => {
                        notice = None;
                        request(session, action);
                    }
                    None => {}
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            Some(fetched) = text_rx.recv() => match fetched {
                Ok(detail) => {
                    texts.loaded.insert(detail.info.number, detail);
                }
                Err(e) => log::warn!("Chapter text unavailable: {}", e),
            },
            Some(text) = notice_rx.recv() => notice = Some(text),
            _ = ticker.tick() => {}
        }
    }

    Ok(())
}

/// Toggles the bookmark on the blocking pool and reports the outcome
fn save_bookmark(
    store: &Arc<BookmarkStore>,
    position: Position,
    notices: &mpsc::UnboundedSender<String>,
) {
    let store = Arc::clone(store);
    let notices = notices.clone();
    tokio::spawn(async move {
        let notice = tokio::task::spawn_blocking(move || toggle_bookmark(&store, position))
            .await
            .unwrap_or_else(|e| format!("Could not save bookmark: {}", e));
        let _ = notices.send(notice);
    });
}

fn toggle_bookmark(store: &BookmarkStore, position: Position) -> String {
    match store.update(|list| list.toggle(position)) {
        Ok(true) => format!("Bookmarked {}", position),
        Ok(false) => format!("Removed bookmark {}", position),
        Err(e) => format!("Could not save bookmark: {}", e),
    }
}

fn draw_player_ui(
    term: &Term,
    snapshot: &SessionSnapshot,
    texts: &ChapterTexts,
    elapsed: Option<StdDuration>,
    notice: Option<&str>,
) -> Result<()> {
    term.clear_screen().context("Failed to clear screen")?;

    let detail = snapshot
        .current_chapter()
        .and_then(|chapter| texts.loaded.get(&chapter));

    match (snapshot.position, detail) {
        (Some(position), Some(detail)) => {
            term.write_line(&format!(
                "\n  {} {}  {}",
                style(&detail.info.english_name).bold().cyan(),
                style(&detail.info.name).dim(),
                style(position).bold()
            ))
            .context("Failed to write title")?;
            if let Some(verse) = detail.verse(position.verse()) {
                term.write_line(&format!("\n  {}", verse.text))
                    .context("Failed to write verse")?;
            }
        }
        (Some(position), None) => {
            term.write_line(&format!("\n  {}", style(position).bold().cyan()))
                .context("Failed to write title")?;
        }
        (None, _) => {
            term.write_line(&format!("\n  {}", style("Nothing playing").dim()))
                .context("Failed to write title")?;
        }
    }

    term.write_line("").context("Failed to write blank line")?;

    let status = if snapshot.is_loading {
        style("Loading").cyan()
    } else if snapshot.is_playing() {
        style("Playing").green()
    } else if snapshot.is_paused() {
        style("Paused").yellow()
    } else {
        style("Stopped").red()
    };
    term.write_line(&format!(
        "  Status: {}   {}",
        status,
        format_elapsed(elapsed.unwrap_or_default())
    ))
    .context("Failed to write status")?;

    let volume = if snapshot.volume <= 0.0 {
        "muted".to_string()
    } else {
        format!("{}%", volume_percent(snapshot.volume))
    };
    term.write_line(&format!("  Volume: {}", volume))
        .context("Failed to write volume")?;

    if let Some(error) = &snapshot.error {
        term.write_line(&format!("  {}", style(error).red()))
            .context("Failed to write error")?;
    }
    if let Some(notice) = notice {
        term.write_line(&format!("  {}", style(notice).green()))
            .context("Failed to write notice")?;
    }

    term.write_line("").context("Failed to write blank line")?;
    term.write_line("  Controls:")
        .context("Failed to write controls header")?;
    for line in [
        "    Space   - Play/Pause",
        "    N/P     - Next/previous verse",
        "    +/-     - Volume up/down",
        "    M       - Mute",
        "    B       - Bookmark verse",
        "    Q/Esc   - Quit",
    ] {
        term.write_line(line).context("Failed to write control")?;
    }

    Ok(())
}

fn format_elapsed(elapsed: StdDuration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn volume_percent(level: f32) -> u8 {
    (level.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_engine::SessionState;

    fn snapshot(state: SessionState, position: Option<Position>) -> SessionSnapshot {
        SessionSnapshot {
            state,
            position,
            ..SessionSnapshot::new(0.5)
        }
    }

    #[test]
    fn test_space_toggles_transport() {
        let verse = Position::new(1, 3).ok();
        assert_eq!(
            action_for(&Key::Char(' '), &snapshot(SessionState::Playing, verse), 0.05),
            Some(Action::Pause)
        );
        assert_eq!(
            action_for(&Key::Char(' '), &snapshot(SessionState::Paused, verse), 0.05),
            Some(Action::Resume)
        );
        assert_eq!(
            action_for(&Key::Char(' '), &snapshot(SessionState::Idle, verse), 0.05),
            Some(Action::PlayAt(1, 3))
        );
        assert_eq!(
            action_for(&Key::Char(' '), &snapshot(SessionState::Idle, None), 0.05),
            None
        );
    }

    #[test]
    fn test_volume_keys_clamp() {
        let mut loud = snapshot(SessionState::Playing, None);
        loud.volume = 0.98;
        assert_eq!(
            action_for(&Key::Char('+'), &loud, 0.05),
            Some(Action::SetVolume(1.0))
        );

        let mut quiet = snapshot(SessionState::Playing, None);
        quiet.volume = 0.02;
        assert_eq!(
            action_for(&Key::Char('-'), &quiet, 0.05),
            Some(Action::SetVolume(0.0))
        );
    }

    #[test]
    fn test_bookmark_needs_a_position() {
        let verse = Position::new(18, 10).unwrap();
        assert_eq!(
            action_for(&Key::Char('b'), &snapshot(SessionState::Paused, Some(verse)), 0.05),
            Some(Action::Bookmark(verse))
        );
        assert_eq!(
            action_for(&Key::Char('b'), &snapshot(SessionState::Idle, None), 0.05),
            None
        );
    }

    #[test]
    fn test_navigation_and_quit_keys() {
        let idle = snapshot(SessionState::Idle, None);
        assert_eq!(action_for(&Key::Char('n'), &idle, 0.05), Some(Action::Next));
        assert_eq!(action_for(&Key::Char('p'), &idle, 0.05), Some(Action::Previous));
        assert_eq!(action_for(&Key::Char('m'), &idle, 0.05), Some(Action::ToggleMute));
        assert_eq!(action_for(&Key::Escape, &idle, 0.05), Some(Action::Quit));
        assert_eq!(action_for(&Key::Char('x'), &idle, 0.05), None);
    }

    #[test]
    fn test_toggle_bookmark_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookmarkStore::new(dir.path().join("bookmarks.json"));
        let verse = Position::new(2, 255).unwrap();

        assert_eq!(toggle_bookmark(&store, verse), "Bookmarked 2:255");
        assert!(store.load().unwrap().is_bookmarked(verse));
        assert_eq!(toggle_bookmark(&store, verse), "Removed bookmark 2:255");
    }

    #[tokio::test]
    async fn test_bookmark_and_last_read_both_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(BookmarkStore::new(dir.path().join("bookmarks.json")));
        let verse = Position::new(36, 12).unwrap();

        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
        let recorder = tokio::spawn(record_last_read(Arc::clone(&store), loaded_rx));
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();

        loaded_tx.send(verse).unwrap();
        save_bookmark(&store, verse, &notice_tx);
        drop(loaded_tx);

        assert_eq!(notice_rx.recv().await.unwrap(), "Bookmarked 36:12");
        recorder.await.unwrap();

        let list = store.load().unwrap();
        assert!(list.is_bookmarked(verse));
        assert_eq!(list.last_read().map(|l| l.position), Some(verse));
    }

    #[test]
    fn test_session_config_from_settings() {
        let mut config = Config::default();
        config.player.default_volume = 40;
        config.player.advance_delay_ms = 500;

        let session = session_config(&config);
        assert!((session.initial_volume - 0.4).abs() < f32::EPSILON);
        assert!((session.unmute_volume - 0.75).abs() < f32::EPSILON);
        assert_eq!(session.advance_delay, StdDuration::from_millis(500));
        assert_eq!(session.restart_threshold, StdDuration::from_secs(3));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_elapsed(StdDuration::from_secs(75)), "01:15");
        assert_eq!(volume_percent(0.756), 76);
        assert_eq!(volume_percent(1.4), 100);
    }
}
