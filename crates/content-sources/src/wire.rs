//! JSON shapes of the alquran.cloud API

use crate::{SourceError, SourceResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tilawah_core::{ChapterDetail, ChapterInfo, RevelationType, TranslatedVerse, Verse};

/// `{ code, status, data }` wrapper around every response
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: u16,
    pub status: String,
    pub data: Option<T>,
}

/// Parses a body and unwraps its envelope
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(body: &str, what: &str) -> SourceResult<T> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| SourceError::ParseError(format!("JSON parse error: {}", e)))?;

    if envelope.code == 404 {
        return Err(SourceError::NotFound(what.to_string()));
    }
    if envelope.code != 200 {
        return Err(SourceError::Unavailable(format!(
            "{} answered {} {}",
            what, envelope.code, envelope.status
        )));
    }

    let data = envelope
        .data
        .ok_or_else(|| SourceError::ParseError(format!("{} has no data", what)))?;
    serde_json::from_value(data)
        .map_err(|e| SourceError::ParseError(format!("Unexpected {} shape: {}", what, e)))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiChapter {
    pub number: u16,
    pub name: String,
    pub english_name: String,
    pub english_name_translation: String,
    pub number_of_ayahs: u16,
    pub revelation_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiChapterRef {
    pub number: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiVerse {
    pub number: u32,
    pub text: String,
    pub number_in_surah: u16,
    #[serde(default)]
    pub juz: u8,
    #[serde(default)]
    pub surah: Option<ApiChapterRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiChapterDetail {
    #[serde(flatten)]
    pub chapter: ApiChapter,
    pub ayahs: Vec<ApiVerse>,
}

fn revelation_type(raw: &str) -> RevelationType {
    if raw.eq_ignore_ascii_case("medinan") {
        RevelationType::Medinan
    } else {
        RevelationType::Meccan
    }
}

impl From<ApiChapter> for ChapterInfo {
    fn from(api: ApiChapter) -> Self {
        ChapterInfo {
            number: api.number,
            revelation_type: revelation_type(&api.revelation_type),
            name: api.name,
            english_name: api.english_name,
            english_name_translation: api.english_name_translation,
            verse_count: api.number_of_ayahs,
        }
    }
}

impl From<ApiChapterDetail> for ChapterDetail {
    fn from(api: ApiChapterDetail) -> Self {
        let chapter = api.chapter.number;
        // Verses of a single-chapter response omit their chapter reference
        let verses = api
            .ayahs
            .into_iter()
            .map(|verse| Verse {
                chapter: verse.surah.map(|s| s.number).unwrap_or(chapter),
                number: verse.number,
                number_in_chapter: verse.number_in_surah,
                text: verse.text,
                juz: verse.juz,
            })
            .collect();

        ChapterDetail {
            info: api.chapter.into(),
            verses,
        }
    }
}

pub(crate) fn translated_verses(detail: ApiChapterDetail) -> Vec<TranslatedVerse> {
    let chapter = detail.chapter.number;
    detail
        .ayahs
        .into_iter()
        .map(|verse| TranslatedVerse {
            chapter: verse.surah.map(|s| s.number).unwrap_or(chapter),
            number: verse.number,
            number_in_chapter: verse.number_in_surah,
            text: verse.text,
        })
        .collect()
}
