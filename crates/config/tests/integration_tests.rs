//! Integration tests for settings and bookmarks

use tilawah_config::{
    BookmarkStore, ColorScheme, Config, ConfigManager, FontSize, Preferences, CONFIG_VERSION,
};
use tilawah_core::{Position, PreferenceStore};
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf());
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    assert!(manager.initialize()?);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.player.default_volume = 80;
    modified.reader.show_translation = false;
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded.player.default_volume, 80);
    assert!(!reloaded.reader.show_translation);

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_invalid_config_is_not_written() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.save(&Config::default())?;
    assert!(manager.validate()?.is_empty());

    let mut invalid = Config::default();
    invalid.player.reciter = "alafasy".to_string();
    assert!(manager.save(&invalid).is_err());

    assert_eq!(manager.load()?, Config::default());
    Ok(())
}

#[test]
fn test_preferences_survive_restart() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;

    {
        let prefs = Preferences::load(ConfigManager::with_directory(temp_dir.path().to_path_buf()));
        prefs.set_reciter("ar.minshawi")?;
        prefs.set_translation_language("en.sahih")?;
        prefs.set_arabic_font_size(FontSize::Large)?;
        prefs.toggle_theme()?;
    }

    let prefs = Preferences::load(ConfigManager::with_directory(temp_dir.path().to_path_buf()));
    let config = prefs.snapshot();
    assert_eq!(prefs.reciter_id(), "ar.minshawi");
    assert_eq!(config.reader.translation_edition, "en.sahih");
    assert_eq!(config.reader.arabic_font_size, FontSize::Large);
    assert_eq!(config.app.color_scheme, ColorScheme::Light);
    Ok(())
}

#[test]
fn test_bookmarks_beside_config() -> Result<(), Box<dyn std::error::Error>> {
    let (temp_dir, manager) = setup_test_manager()?;
    let store = BookmarkStore::new(manager.bookmarks_path());

    let first = Position::new(2, 255)?;
    let second = Position::new(1, 1)?;
    store.update(|list| {
        list.add(first);
        list.add(second);
        list.set_last_read(first);
    })?;

    assert!(temp_dir.path().join("bookmarks.json").exists());

    let list = BookmarkStore::new(manager.bookmarks_path()).load()?;
    let ordered: Vec<Position> = list.sorted_by_position().iter().map(|b| b.position).collect();
    assert_eq!(ordered, vec![second, first]);
    assert_eq!(list.last_read().map(|l| l.position), Some(first));
    Ok(())
}

#[test]
fn test_removing_bookmark() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    let store = BookmarkStore::new(manager.bookmarks_path());
    let position = Position::new(112, 1)?;

    assert!(store.update(|list| list.add(position))?);
    assert!(!store.update(|list| list.add(position))?);
    assert!(store.update(|list| list.remove(position))?);
    assert!(store.load()?.is_empty());
    Ok(())
}
