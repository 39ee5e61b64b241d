// FILE: crates/content-sources/src/quran_api.rs

use crate::wire::{self, ApiChapter, ApiChapterDetail};
use crate::{SourceError, SourceResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration as StdDuration;
use tilawah_core::{
    quran, verse_audio_locator, AudioLocator, ChapterDetail, ChapterInfo, ContentProvider,
    ContentResult, Position, TranslatedVerse,
};

/// Text API root
pub const DEFAULT_API_BASE: &str = "https://api.alquran.cloud/v1";

/// Audio CDN root for 128 kbit/s recitations
pub const DEFAULT_AUDIO_BASE: &str = "https://cdn.islamic.network/quran/audio/128";

/// Translation edition used when none is configured
pub const DEFAULT_TRANSLATION: &str = "en.asad";

/// Client for the alquran.cloud text API and the islamic.network audio CDN
pub struct QuranApi {
    base_url: String,
    audio_base_url: String,
    client: reqwest::Client,
    verse_counts: Mutex<HashMap<u16, u16>>,
}

impl QuranApi {
    /// Create a client against the public endpoints
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_API_BASE, DEFAULT_AUDIO_BASE, StdDuration::from_secs(30))
    }

    pub fn with_endpoints(
        base_url: impl Into<String>,
        audio_base_url: impl Into<String>,
        timeout: StdDuration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to a default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            audio_base_url: audio_base_url.into().trim_end_matches('/').to_string(),
            client,
            verse_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All 114 chapters
    pub async fn all_chapters(&self) -> SourceResult<Vec<ChapterInfo>> {
        let chapters: Vec<ApiChapter> = self.get("/surah", "chapter list").await?;
        for chapter in &chapters {
            self.remember_count(chapter.number, chapter.number_of_ayahs);
        }
        Ok(chapters.into_iter().map(Into::into).collect())
    }

    /// One chapter with its verses
    pub async fn chapter(&self, number: u16) -> SourceResult<ChapterDetail> {
        check_chapter(number)?;
        let detail: ApiChapterDetail = self
            .get(&format!("/surah/{}", number), &format!("chapter {}", number))
            .await?;
        self.remember_count(number, detail.chapter.number_of_ayahs);
        Ok(detail.into())
    }

    /// A chapter's verses in a translation edition such as `en.asad`
    pub async fn translation(&self, number: u16, edition: &str) -> SourceResult<Vec<TranslatedVerse>> {
        check_chapter(number)?;
        if edition.trim().is_empty() {
            return Err(SourceError::InvalidQuery("Empty translation edition".to_string()));
        }
        let detail: ApiChapterDetail = self
            .get(
                &format!("/surah/{}/{}", number, edition),
                &format!("translation {} of chapter {}", edition, number),
            )
            .await?;
        Ok(wire::translated_verses(detail))
    }

    /// Recitation of a whole chapter
    pub fn chapter_audio_url(&self, number: u16, reciter: &str) -> SourceResult<AudioLocator> {
        check_chapter(number)?;
        let root = self
            .audio_base_url
            .rsplit_once("/audio/")
            .map(|(root, bitrate)| format!("{}/audio-surah/{}", root, bitrate))
            .unwrap_or_else(|| format!("{}/audio-surah", self.audio_base_url));
        Ok(AudioLocator::new(format!("{}/{}/{}.mp3", root, reciter, number)))
    }

    /// Verse count as reported by the API, cached after the first fetch
    pub async fn verse_count(&self, number: u16) -> SourceResult<u16> {
        if let Some(count) = self.cached_count(number) {
            return Ok(count);
        }
        Ok(self.chapter(number).await?.info.verse_count)
    }

    fn cached_count(&self, number: u16) -> Option<u16> {
        self.verse_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(&number).copied())
    }

    fn remember_count(&self, number: u16, count: u16) {
        if let Ok(mut counts) = self.verse_counts.lock() {
            counts.insert(number, count);
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> SourceResult<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkError(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::NetworkError(format!("Failed to read body: {}", e)))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            // The API still sends an envelope for most errors
            return match wire::unwrap_envelope::<serde_json::Value>(&body, what) {
                Err(e @ SourceError::NotFound(_)) => Err(e),
                _ => Err(SourceError::NetworkError(format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ))),
            };
        }

        wire::unwrap_envelope(&body, what)
    }
}

impl Default for QuranApi {
    fn default() -> Self {
        Self::new()
    }
}

fn check_chapter(number: u16) -> SourceResult<()> {
    if quran::is_valid_chapter(number) {
        Ok(())
    } else {
        Err(SourceError::InvalidQuery(format!(
            "chapter {} (must be between 1 and {})",
            number,
            quran::CHAPTER_COUNT
        )))
    }
}

#[async_trait]
impl ContentProvider for QuranApi {
    async fn chapter_verse_count(&self, chapter: u16) -> ContentResult<u16> {
        Ok(self.verse_count(chapter).await?)
    }

    fn audio_locator(&self, position: Position, reciter: &str) -> ContentResult<AudioLocator> {
        verse_audio_locator(&self.audio_base_url, position, reciter)
    }
}
