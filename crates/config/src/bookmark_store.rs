//! JSON persistence for bookmarks and the last-read position

use crate::persistence::write_atomic;
use crate::{ConfigError, ConfigResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tilawah_core::BookmarkList;

/// `bookmarks.json` beside the config file
///
/// Writers sharing one store are serialised, so concurrent updates from
/// different threads never overwrite each other.
pub struct BookmarkStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl BookmarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the list, empty when the file does not exist yet
    pub fn load(&self) -> ConfigResult<BookmarkList> {
        if !self.path.exists() {
            return Ok(BookmarkList::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&contents).map_err(|e| ConfigError::BookmarkParseError {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Like [`load`](Self::load), but a corrupt file is logged and ignored
    pub fn load_or_default(&self) -> BookmarkList {
        self.load().unwrap_or_else(|e| {
            log::warn!("Failed to load bookmarks: {}, starting empty", e);
            BookmarkList::new()
        })
    }

    pub fn save(&self, bookmarks: &BookmarkList) -> ConfigResult<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.write(bookmarks)
    }

    fn write(&self, bookmarks: &BookmarkList) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(bookmarks)
            .map_err(ConfigError::BookmarkSerializeError)?;
        write_atomic(&self.path, &json)?;
        log::debug!("Saved {} bookmarks to {}", bookmarks.len(), self.path.display());
        Ok(())
    }

    /// Loads, applies `update_fn` and saves; returns the closure's result
    ///
    /// A file that cannot be read or parsed is left untouched and reported.
    pub fn update<F, T>(&self, update_fn: F) -> ConfigResult<T>
    where
        F: FnOnce(&mut BookmarkList) -> T,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut bookmarks = self.load()?;
        let result = update_fn(&mut bookmarks);
        self.write(&bookmarks)?;
        Ok(result)
    }
}
