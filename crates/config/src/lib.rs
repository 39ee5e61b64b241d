//! Tilawah settings and bookmarks
//!
//! Settings live in `config.toml`, bookmarks in `bookmarks.json`, both under
//! the user config directory and both written atomically.
//!
//! # Example
//!
//! ```no_run
//! use tilawah_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Reciter: {}", config.player.reciter);
//! ```

mod bookmark_store;
mod error;
mod manager;
mod persistence;
mod preferences;
mod validation;

pub mod app_config;
pub mod content_config;
pub mod player_config;
pub mod reader_config;

pub use bookmark_store::BookmarkStore;
pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{ConfigManager, ENV_PREFIX};
pub use preferences::Preferences;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, ColorScheme, LogLevel};
pub use content_config::ContentConfig;
pub use player_config::PlayerConfig;
pub use reader_config::{FontSize, ReaderConfig};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Log level and colour scheme
    pub app: AppConfig,

    /// Text display
    pub reader: ReaderConfig,

    /// Recitation playback
    pub player: PlayerConfig,

    /// Where text and audio come from
    pub content: ContentConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.reader.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.content.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.reader.merge(other.reader);
        self.player.merge(other.player);
        self.content.merge(other.content);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            reader: ReaderConfig::default(),
            player: PlayerConfig::default(),
            content: ContentConfig::default(),
        }
    }
}
