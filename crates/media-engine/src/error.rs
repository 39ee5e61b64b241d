// FILE: crates/media-engine/src/error.rs

use thiserror::Error;
use tilawah_core::{ContentError, CoreError};

/// Everything that can end a playback transition
///
/// The first four variants are stored in the session snapshot when they
/// happen. `Superseded` and `SessionClosed` are only ever returned to the
/// caller that issued the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Content lookup failed: {0}")]
    ContentLookupFailure(String),

    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    #[error("Playback error: {0}")]
    PlaybackRuntimeError(String),

    #[error("Request superseded by a newer transition")]
    Superseded,

    #[error("Playback session has shut down")]
    SessionClosed,
}

impl PlaybackError {
    /// True when the platform refused to start audio without a user gesture
    pub fn needs_user_gesture(&self) -> bool {
        matches!(self, Self::PlaybackRejected(_))
    }

    /// True for errors that describe the session rather than one request
    pub fn is_session_error(&self) -> bool {
        !matches!(self, Self::Superseded | Self::SessionClosed)
    }
}

impl From<CoreError> for PlaybackError {
    fn from(err: CoreError) -> Self {
        Self::InvalidPosition(err.to_string())
    }
}

impl From<ContentError> for PlaybackError {
    fn from(err: ContentError) -> Self {
        Self::ContentLookupFailure(err.to_string())
    }
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
