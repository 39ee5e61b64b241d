//! Domain types for Tilawah
//!
//! - `position`: validated (chapter, verse) pairs
//! - `quran`: the static verse-count table and absolute indexing
//! - `chapter`: chapter and verse content models
//! - `bookmark`: user bookmarks and the last-read marker
//! - `common`: shared utilities

mod bookmark;
mod chapter;
mod common;
mod position;
pub mod quran;

pub use bookmark::{Bookmark, BookmarkList, LastRead};
pub use chapter::{ChapterDetail, ChapterInfo, RevelationType, TranslatedVerse, Verse};
pub use common::Timestamp;
pub use position::Position;
