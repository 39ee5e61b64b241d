//! Tilawah core: positions, the static verse table, bookmarks, and the
//! interfaces the playback engine consumes.

pub mod error;
pub mod providers;
pub mod types;

// Re-export commonly used types
pub use error::{ContentError, ContentResult, CoreError, CoreResult, ErrorSeverity};
pub use providers::{
    verse_audio_locator, AudioLocator, ContentProvider, FixedReciter, PreferenceStore,
    DEFAULT_RECITER,
};
pub use types::quran::{self, daily_position, CHAPTER_COUNT, TOTAL_VERSES};
pub use types::{
    Bookmark, BookmarkList, ChapterDetail, ChapterInfo, LastRead, Position, RevelationType,
    Timestamp, TranslatedVerse, Verse,
};
