//! Chapter and verse content models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a chapter was revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevelationType {
    Meccan,
    Medinan,
}

impl fmt::Display for RevelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevelationType::Meccan => write!(f, "Meccan"),
            RevelationType::Medinan => write!(f, "Medinan"),
        }
    }
}

/// Summary of one chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub number: u16,
    /// Arabic name
    pub name: String,
    pub english_name: String,
    pub english_name_translation: String,
    pub verse_count: u16,
    pub revelation_type: RevelationType,
}

/// One verse of scripture text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    /// Absolute index across the collection
    pub number: u32,
    /// Index inside its chapter
    pub number_in_chapter: u16,
    pub text: String,
    pub juz: u8,
    pub chapter: u16,
}

/// A chapter with all of its verses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterDetail {
    pub info: ChapterInfo,
    pub verses: Vec<Verse>,
}

impl ChapterDetail {
    /// Looks up a verse by its index inside the chapter
    pub fn verse(&self, number_in_chapter: u16) -> Option<&Verse> {
        self.verses
            .iter()
            .find(|v| v.number_in_chapter == number_in_chapter)
    }
}

/// Translated text of one verse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedVerse {
    pub number: u32,
    pub number_in_chapter: u16,
    pub chapter: u16,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChapterDetail {
        ChapterDetail {
            info: ChapterInfo {
                number: 1,
                name: "الفاتحة".to_string(),
                english_name: "Al-Faatiha".to_string(),
                english_name_translation: "The Opening".to_string(),
                verse_count: 2,
                revelation_type: RevelationType::Meccan,
            },
            verses: vec![
                Verse {
                    number: 1,
                    number_in_chapter: 1,
                    text: "first".to_string(),
                    juz: 1,
                    chapter: 1,
                },
                Verse {
                    number: 2,
                    number_in_chapter: 2,
                    text: "second".to_string(),
                    juz: 1,
                    chapter: 1,
                },
            ],
        }
    }

    #[test]
    fn test_verse_lookup() {
        let detail = sample();
        assert_eq!(detail.verse(2).map(|v| v.text.as_str()), Some("second"));
        assert!(detail.verse(3).is_none());
    }

    #[test]
    fn test_revelation_display() {
        assert_eq!(RevelationType::Medinan.to_string(), "Medinan");
    }
}
