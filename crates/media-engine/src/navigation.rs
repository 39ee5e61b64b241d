//! Next/previous verse arithmetic
//!
//! Pure functions over positions and verse counts. The session does the
//! lookups; these only decide where to go.

use tilawah_core::{Position, CHAPTER_COUNT};

/// Where playback goes after the current verse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Play(Position),
    /// Last verse of the last chapter, nothing follows
    EndOfCollection,
}

/// Where a "previous" request leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousStep {
    /// Earlier verse in the same chapter
    Play(Position),
    /// Last verse of this chapter, whose count must be looked up
    LastVerseOf(u16),
    /// Verse 1 of chapter 1
    StartOfCollection,
}

/// Next position given the authoritative verse count of the current chapter
pub fn next_step(current: Position, verses_in_chapter: u16) -> NextStep {
    let chapter = u32::from(current.chapter());
    let verse = u32::from(current.verse());

    let target = if verse < u32::from(verses_in_chapter) {
        Position::new(chapter, verse + 1)
    } else if current.chapter() < CHAPTER_COUNT {
        Position::new(chapter + 1, 1)
    } else {
        return NextStep::EndOfCollection;
    };

    match target {
        Ok(position) => NextStep::Play(position),
        Err(_) => NextStep::EndOfCollection,
    }
}

/// Previous position, before any lookup
pub fn previous_step(current: Position) -> PreviousStep {
    if current.verse() > 1 {
        match Position::new(u32::from(current.chapter()), u32::from(current.verse()) - 1) {
            Ok(position) => PreviousStep::Play(position),
            Err(_) => PreviousStep::StartOfCollection,
        }
    } else if current.chapter() > 1 {
        PreviousStep::LastVerseOf(current.chapter() - 1)
    } else {
        PreviousStep::StartOfCollection
    }
}
