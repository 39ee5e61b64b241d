//! Collaborator interfaces consumed by the playback session
//!
//! The session never sees concrete HTTP clients or settings files. It talks
//! to a [`ContentProvider`] for verse counts and audio locations, and to a
//! [`PreferenceStore`] for the selected reciter.

use crate::error::{ContentError, ContentResult};
use crate::types::Position;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reciter used when nothing else is configured
pub const DEFAULT_RECITER: &str = "ar.alafasy";

/// Location of one playable audio file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioLocator(String);

impl AudioLocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension of the final path segment, if any
    pub fn extension(&self) -> Option<&str> {
        let path = self.0.split(['?', '#']).next().unwrap_or("");
        let file = path.rsplit('/').next()?;
        let (_, ext) = file.rsplit_once('.')?;
        (!ext.is_empty()).then_some(ext)
    }
}

impl fmt::Display for AudioLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds `{base}/{reciter}/{absolute index}.mp3` from the static table
pub fn verse_audio_locator(
    base_url: &str,
    position: Position,
    reciter: &str,
) -> ContentResult<AudioLocator> {
    if reciter.trim().is_empty() {
        return Err(ContentError::NotFound {
            what: "reciter with an empty identifier".to_string(),
        });
    }

    let index = position.absolute_index().ok_or_else(|| ContentError::NotFound {
        what: format!("verse {}", position),
    })?;

    Ok(AudioLocator::new(format!(
        "{}/{}/{}.mp3",
        base_url.trim_end_matches('/'),
        reciter,
        index
    )))
}

/// Source of chapter shapes and audio locations
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Authoritative verse count of a chapter
    ///
    /// Fails with [`ContentError::NotFound`] outside 1..=114 or when the
    /// upstream data is missing.
    async fn chapter_verse_count(&self, chapter: u16) -> ContentResult<u16>;

    /// Playable audio location for a verse, computed without I/O
    fn audio_locator(&self, position: Position, reciter: &str) -> ContentResult<AudioLocator>;
}

#[async_trait]
impl<T: ContentProvider + ?Sized> ContentProvider for Arc<T> {
    async fn chapter_verse_count(&self, chapter: u16) -> ContentResult<u16> {
        (**self).chapter_verse_count(chapter).await
    }

    fn audio_locator(&self, position: Position, reciter: &str) -> ContentResult<AudioLocator> {
        (**self).audio_locator(position, reciter)
    }
}

/// Read-only view of user preferences
pub trait PreferenceStore: Send + Sync {
    /// Identifier of the selected reciter
    fn reciter_id(&self) -> String;
}

/// A preference store pinned to one reciter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedReciter(pub String);

impl FixedReciter {
    pub fn new(reciter: impl Into<String>) -> Self {
        Self(reciter.into())
    }
}

impl Default for FixedReciter {
    fn default() -> Self {
        Self::new(DEFAULT_RECITER)
    }
}

impl PreferenceStore for FixedReciter {
    fn reciter_id(&self) -> String {
        self.0.clone()
    }
}
