//! Offline provider backed by the built-in verse table

use async_trait::async_trait;
use tilawah_core::{
    quran, verse_audio_locator, AudioLocator, ContentError, ContentProvider, ContentResult,
    Position,
};

use crate::DEFAULT_AUDIO_BASE;

/// Answers verse counts from the static table, no I/O
#[derive(Debug, Clone)]
pub struct StaticContent {
    audio_base_url: String,
}

impl StaticContent {
    pub fn new() -> Self {
        Self::with_audio_base(DEFAULT_AUDIO_BASE)
    }

    /// Audio root, e.g. a local mirror directory
    pub fn with_audio_base(audio_base_url: impl Into<String>) -> Self {
        Self {
            audio_base_url: audio_base_url.into(),
        }
    }
}

impl Default for StaticContent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentProvider for StaticContent {
    async fn chapter_verse_count(&self, chapter: u16) -> ContentResult<u16> {
        quran::verses_in(chapter).ok_or_else(|| ContentError::chapter_not_found(u32::from(chapter)))
    }

    fn audio_locator(&self, position: Position, reciter: &str) -> ContentResult<AudioLocator> {
        verse_audio_locator(&self.audio_base_url, position, reciter)
    }
}
