//! Observable session state

use crate::error::PlaybackError;
use tilawah_core::Position;

/// Transport state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No audible track
    Idle,
    /// A transition is in progress, nothing audible yet
    Loading,
    Playing,
    Paused,
}

/// Read-only snapshot published after every transition
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub is_loading: bool,
    /// Position of the resource that is loading or loaded
    pub position: Option<Position>,
    pub volume: f32,
    /// Most recent failure, cleared by the next request or `stop`
    pub error: Option<PlaybackError>,
}

impl SessionSnapshot {
    pub fn new(volume: f32) -> Self {
        Self {
            state: SessionState::Idle,
            is_loading: false,
            position: None,
            volume,
            error: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn current_chapter(&self) -> Option<u16> {
        self.position.map(|p| p.chapter())
    }

    pub fn current_verse(&self) -> Option<u16> {
        self.position.map(|p| p.verse())
    }
}
