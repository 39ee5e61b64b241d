//! Verse positions

use crate::error::{CoreError, CoreResult};
use crate::types::quran::{self, CHAPTER_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A (chapter, verse) pair inside the collection
///
/// Construction checks the chapter against 1..=114 and the verse against
/// zero. The upper verse bound is deliberately left to whoever supplies
/// verse counts; use [`Position::within_table`] to check against the static
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    chapter: u16,
    verse: u16,
}

impl Position {
    /// The first verse of the collection
    pub const FIRST: Position = Position { chapter: 1, verse: 1 };

    /// Creates a position from raw numbers
    pub fn new(chapter: u32, verse: u32) -> CoreResult<Self> {
        if chapter == 0 || chapter > u32::from(CHAPTER_COUNT) {
            return Err(CoreError::InvalidChapter {
                chapter,
                max: CHAPTER_COUNT,
            });
        }

        let verse_num = u16::try_from(verse)
            .ok()
            .filter(|&v| v > 0)
            .ok_or(CoreError::InvalidVerse { chapter, verse })?;

        Ok(Self {
            chapter: chapter as u16,
            verse: verse_num,
        })
    }

    /// Creates a position and checks the verse against the static table
    pub fn within_table(chapter: u32, verse: u32) -> CoreResult<Self> {
        let position = Self::new(chapter, verse)?;
        let count = quran::verses_in(position.chapter).unwrap_or(0);
        if position.verse > count {
            return Err(CoreError::VerseOutOfRange {
                chapter: position.chapter,
                verse: position.verse,
                count,
            });
        }
        Ok(position)
    }

    /// First verse of a chapter
    pub fn chapter_start(chapter: u32) -> CoreResult<Self> {
        Self::new(chapter, 1)
    }

    pub fn chapter(&self) -> u16 {
        self.chapter
    }

    pub fn verse(&self) -> u16 {
        self.verse
    }

    /// True for verse 1 of chapter 1
    pub fn is_first(&self) -> bool {
        *self == Self::FIRST
    }

    /// True for the final chapter of the collection
    pub fn is_in_last_chapter(&self) -> bool {
        self.chapter == CHAPTER_COUNT
    }

    /// Absolute 1-based index across the collection, from the static table
    pub fn absolute_index(&self) -> Option<u32> {
        quran::absolute_verse_index(self.chapter, self.verse)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

impl FromStr for Position {
    type Err = CoreError;

    /// Parses `CHAPTER:VERSE`, or a bare `CHAPTER` meaning its first verse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoreError::MalformedPosition {
            input: s.to_string(),
        };

        let mut parts = s.trim().splitn(2, ':');
        let chapter = parts
            .next()
            .and_then(|c| c.trim().parse::<u32>().ok())
            .ok_or_else(malformed)?;
        let verse = match parts.next() {
            Some(v) => v.trim().parse::<u32>().map_err(|_| malformed())?,
            None => 1,
        };

        Self::new(chapter, verse)
    }
}
