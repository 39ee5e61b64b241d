//! Bookmark and last-read models

use crate::types::{Position, Timestamp};
use serde::{Deserialize, Serialize};

/// A saved verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub position: Position,
    pub created_at: Timestamp,
}

impl Bookmark {
    /// Creates a bookmark stamped with the current time
    pub fn new(position: Position) -> Self {
        Self {
            position,
            created_at: Timestamp::now(),
        }
    }
}

/// The verse the reader last reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRead {
    pub position: Position,
    pub at: Timestamp,
}

/// Bookmarks in insertion order plus the last-read marker
///
/// A position is bookmarked at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookmarkList {
    bookmarks: Vec<Bookmark>,
    last_read: Option<LastRead>,
}

impl BookmarkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bookmark, returns false if the position was already saved
    pub fn add(&mut self, position: Position) -> bool {
        if self.is_bookmarked(position) {
            return false;
        }
        self.bookmarks.push(Bookmark::new(position));
        true
    }

    /// Removes a bookmark, returns false if it was not present
    pub fn remove(&mut self, position: Position) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.position != position);
        self.bookmarks.len() != before
    }

    /// Flips the bookmark state of a position, returns the new state
    pub fn toggle(&mut self, position: Position) -> bool {
        if self.remove(position) {
            false
        } else {
            self.add(position)
        }
    }

    pub fn is_bookmarked(&self, position: Position) -> bool {
        self.bookmarks.iter().any(|b| b.position == position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.bookmarks.iter()
    }

    /// Bookmarks ordered by position in the collection
    pub fn sorted_by_position(&self) -> Vec<&Bookmark> {
        let mut sorted: Vec<&Bookmark> = self.bookmarks.iter().collect();
        sorted.sort_by_key(|b| b.position);
        sorted
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    pub fn set_last_read(&mut self, position: Position) {
        self.last_read = Some(LastRead {
            position,
            at: Timestamp::now(),
        });
    }

    pub fn last_read(&self) -> Option<LastRead> {
        self.last_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(c: u32, v: u32) -> Position {
        Position::new(c, v).unwrap()
    }

    #[test]
    fn test_add_is_unique() {
        let mut list = BookmarkList::new();
        assert!(list.add(pos(2, 255)));
        assert!(!list.add(pos(2, 255)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut list = BookmarkList::new();
        list.add(pos(1, 1));
        assert!(list.remove(pos(1, 1)));
        assert!(!list.remove(pos(1, 1)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut list = BookmarkList::new();
        assert!(list.toggle(pos(36, 1)));
        assert!(list.is_bookmarked(pos(36, 1)));
        assert!(!list.toggle(pos(36, 1)));
        assert!(!list.is_bookmarked(pos(36, 1)));
    }

    #[test]
    fn test_sorted_by_position() {
        let mut list = BookmarkList::new();
        list.add(pos(18, 10));
        list.add(pos(2, 255));
        list.add(pos(18, 1));
        let order: Vec<String> = list
            .sorted_by_position()
            .iter()
            .map(|b| b.position.to_string())
            .collect();
        assert_eq!(order, vec!["2:255", "18:1", "18:10"]);
    }

    #[test]
    fn test_last_read() {
        let mut list = BookmarkList::new();
        assert!(list.last_read().is_none());
        list.set_last_read(pos(67, 3));
        assert_eq!(list.last_read().map(|l| l.position), Some(pos(67, 3)));
    }

    #[test]
    fn test_serde_roundtrip_keeps_last_read() {
        let mut list = BookmarkList::new();
        list.add(pos(1, 5));
        list.set_last_read(pos(1, 5));
        let json = serde_json::to_string(&list).unwrap();
        let back: BookmarkList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }
}
