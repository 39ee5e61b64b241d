//! User preferences backed by `config.toml`

use crate::app_config::ColorScheme;
use crate::reader_config::FontSize;
use crate::{Config, ConfigManager, ConfigResult};
use std::sync::{PoisonError, RwLock};
use tilawah_core::{PreferenceStore, DEFAULT_RECITER};

/// Loaded settings plus the manager that persists them
///
/// Every setter writes the file before returning. A setter that fails to
/// save leaves the in-memory value unchanged.
pub struct Preferences {
    manager: ConfigManager,
    config: RwLock<Config>,
}

impl Preferences {
    /// Loads the config file, falling back to defaults
    pub fn load(manager: ConfigManager) -> Self {
        let config = manager.load_or_default();
        Self::with_config(manager, config)
    }

    pub fn with_config(manager: ConfigManager, config: Config) -> Self {
        Self {
            manager,
            config: RwLock::new(config),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }

    pub fn set_reciter(&self, reciter: impl Into<String>) -> ConfigResult<()> {
        let reciter = reciter.into();
        self.modify(|config| config.player.reciter = reciter)
    }

    /// Selects the translation edition, e.g. `en.sahih`
    pub fn set_translation_language(&self, edition: impl Into<String>) -> ConfigResult<()> {
        let edition = edition.into();
        self.modify(|config| config.reader.translation_edition = edition)
    }

    /// Flips translation display, returns the new setting
    pub fn toggle_translation(&self) -> ConfigResult<bool> {
        self.modify(|config| {
            config.reader.show_translation = !config.reader.show_translation;
        })?;
        Ok(self.snapshot().reader.show_translation)
    }

    /// Switches between light and dark, returns the new scheme
    pub fn toggle_theme(&self) -> ConfigResult<ColorScheme> {
        self.modify(|config| {
            config.app.color_scheme = config.app.color_scheme.toggled();
        })?;
        Ok(self.snapshot().app.color_scheme)
    }

    pub fn set_arabic_font_size(&self, size: FontSize) -> ConfigResult<()> {
        self.modify(|config| config.reader.arabic_font_size = size)
    }

    pub fn set_translation_font_size(&self, size: FontSize) -> ConfigResult<()> {
        self.modify(|config| config.reader.translation_font_size = size)
    }

    fn modify<F>(&self, change: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = guard.clone();
        change(&mut updated);
        self.manager.save(&updated)?;
        *guard = updated;
        Ok(())
    }
}

impl PreferenceStore for Preferences {
    fn reciter_id(&self) -> String {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        if config.player.reciter.trim().is_empty() {
            DEFAULT_RECITER.to_string()
        } else {
            config.player.reciter.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn preferences() -> (TempDir, Preferences) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf());
        (temp_dir, Preferences::load(manager))
    }

    #[test]
    fn test_default_reciter() {
        let (_temp_dir, prefs) = preferences();
        assert_eq!(prefs.reciter_id(), DEFAULT_RECITER);
    }

    #[test]
    fn test_set_reciter_persists() {
        let (_temp_dir, prefs) = preferences();
        prefs.set_reciter("ar.husary").expect("Should save");

        assert_eq!(prefs.reciter_id(), "ar.husary");
        let on_disk = prefs.manager().load().expect("Should load");
        assert_eq!(on_disk.player.reciter, "ar.husary");
    }

    #[test]
    fn test_invalid_value_is_not_applied() {
        let (_temp_dir, prefs) = preferences();
        assert!(prefs.set_translation_language("english").is_err());
        assert_eq!(prefs.snapshot().reader.translation_edition, "en.asad");
        assert!(!prefs.manager().config_path().exists());
    }

    #[test]
    fn test_toggles() {
        let (_temp_dir, prefs) = preferences();

        assert!(!prefs.toggle_translation().expect("Should save"));
        assert!(prefs.toggle_translation().expect("Should save"));
        assert_eq!(prefs.toggle_theme().expect("Should save"), ColorScheme::Light);

        let on_disk = prefs.manager().load().expect("Should load");
        assert!(on_disk.reader.show_translation);
        assert_eq!(on_disk.app.color_scheme, ColorScheme::Light);
    }

    #[test]
    fn test_font_sizes() {
        let (_temp_dir, prefs) = preferences();
        prefs.set_arabic_font_size(FontSize::Large).expect("Should save");
        prefs.set_translation_font_size(FontSize::Small).expect("Should save");

        let config = prefs.manager().load().expect("Should load");
        assert_eq!(config.reader.arabic_font_size, FontSize::Large);
        assert_eq!(config.reader.translation_font_size, FontSize::Small);
    }
}
