// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use tilawah_config::{BookmarkStore, Config, ConfigManager, Preferences};
use tilawah_content_sources::QuranApi;
use tilawah_core::{
    daily_position, quran, ChapterDetail, ChapterInfo, Position, TranslatedVerse, Verse,
};

/// API client built from the `[content]` settings
pub fn api_client(config: &Config) -> QuranApi {
    QuranApi::with_endpoints(
        config.content.api_base_url.clone(),
        config.content.audio_base_url(),
        config.content.request_timeout(),
    )
}

/// List all chapters
pub async fn list_chapters(config: &Config) -> Result<()> {
    let chapters = api_client(config)
        .all_chapters()
        .await
        .context("Failed to fetch chapter list")?;

    println!("\n{} Chapters", style(chapters.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for chapter in &chapters {
        print_chapter_summary(chapter);
    }

    Ok(())
}

/// Print a chapter, optionally interleaved with its translation
pub async fn read_chapter(config: &Config, matches: &ArgMatches) -> Result<()> {
    let number = matches
        .get_one::<u16>("chapter")
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Chapter is required"))?;
    let with_translation = matches.get_flag("translation") || config.reader.show_translation;

    let api = api_client(config);
    let detail = api
        .chapter(number)
        .await
        .with_context(|| format!("Failed to fetch chapter {}", number))?;

    let translation = if with_translation {
        let edition = &config.reader.translation_edition;
        match api.translation(number, edition).await {
            Ok(verses) => verses,
            Err(e) => {
                eprintln!("Warning: translation {} unavailable: {}", edition, e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    print_chapter(&detail, &translation);
    Ok(())
}

/// Print the verse of the day with its translation and return its position
pub async fn daily_verse(config: &Config, day_of_year: u16) -> Result<Position> {
    let chapter = quran::daily_chapter(day_of_year);
    let api = api_client(config);
    let detail = api
        .chapter(chapter)
        .await
        .with_context(|| format!("Failed to fetch chapter {}", chapter))?;
    let (position, verse) = verse_of_the_day(&detail, day_of_year)?;

    let edition = &config.reader.translation_edition;
    let translation = match api.translation(chapter, edition).await {
        Ok(verses) => verses
            .into_iter()
            .find(|t| t.number_in_chapter == position.verse()),
        Err(e) => {
            log::warn!("Translation {} unavailable: {}", edition, e);
            None
        }
    };

    println!(
        "\n{} {}",
        style("Verse of the day").bold().cyan(),
        style(format!("{} · {}", detail.info.english_name, position)).dim()
    );
    println!("{}", "=".repeat(80));
    println!("\n{}", verse.text);
    if let Some(translated) = translation {
        println!("\n    {}", style(&translated.text).italic());
    }
    Ok(position)
}

fn verse_of_the_day(detail: &ChapterDetail, day_of_year: u16) -> Result<(Position, &Verse)> {
    let position = daily_position(day_of_year, detail.info.verse_count)
        .with_context(|| format!("Chapter {} has no verses", detail.info.number))?;
    let verse = detail
        .verses
        .iter()
        .find(|v| v.number_in_chapter == position.verse())
        .with_context(|| format!("Verse {} missing from the response", position))?;
    Ok((position, verse))
}

/// `bookmarks list|add|remove`
pub fn bookmarks(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    let store = BookmarkStore::new(manager.bookmarks_path());

    match matches.subcommand() {
        Some(("list", _)) => {
            let list = store.load().context("Failed to read bookmarks")?;
            if list.is_empty() {
                println!("No bookmarks yet. Press 'b' while playing or use 'bookmarks add'.");
            } else {
                println!("\n{} Bookmarks", style(list.len()).bold().cyan());
                println!("{}", "=".repeat(40));
                for bookmark in list.sorted_by_position() {
                    println!("  {:<8} saved {}", bookmark.position.to_string(), bookmark.created_at);
                }
            }
            if let Some(last) = list.last_read() {
                println!("\nLast read: {} ({})", style(last.position).bold(), last.at);
            }
            Ok(())
        }
        Some(("add", sub_matches)) => {
            let position = position_from(sub_matches)?;
            let added = store
                .update(|list| list.add(position))
                .context("Failed to save bookmarks")?;
            if added {
                println!("{} Bookmarked {}", style("✓").green().bold(), position);
            } else {
                println!("{} is already bookmarked", position);
            }
            Ok(())
        }
        Some(("remove", sub_matches)) => {
            let position = position_from(sub_matches)?;
            let removed = store
                .update(|list| list.remove(position))
                .context("Failed to save bookmarks")?;
            if removed {
                println!("{} Removed bookmark {}", style("✓").green().bold(), position);
            } else {
                bail!("{} is not bookmarked", position);
            }
            Ok(())
        }
        _ => bail!("Unknown bookmarks command"),
    }
}

/// `config init|show|path|set-reciter|reset`
pub fn config(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            if manager.initialize().context("Failed to write config")? {
                println!("Created {}", manager.config_path().display());
            } else {
                println!("Config already exists at {}", manager.config_path().display());
            }
            Ok(())
        }
        Some(("show", _)) => {
            let config = manager
                .load_with_env_overrides()
                .context("Failed to load config")?;
            let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
            println!("{}", rendered);
            for problem in manager.validate().unwrap_or_default() {
                eprintln!("{} {}", style("warning:").yellow().bold(), problem);
            }
            Ok(())
        }
        Some(("path", _)) => {
            println!("{}", manager.config_path().display());
            Ok(())
        }
        Some(("set-reciter", sub_matches)) => {
            let id = sub_matches
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("Reciter id is required"))?;
            let prefs = Preferences::load(ConfigManager::with_directory(manager.config_dir().clone()));
            prefs
                .set_reciter(id.as_str())
                .with_context(|| format!("Failed to set reciter to '{}'", id))?;
            println!("{} Reciter set to {}", style("✓").green().bold(), id);
            Ok(())
        }
        Some(("reset", _)) => {
            manager.reset().context("Failed to reset config")?;
            println!("{} Settings restored to defaults", style("✓").green().bold());
            Ok(())
        }
        _ => bail!("Unknown config command"),
    }
}

/// Parses and checks a `CHAPTER:VERSE` argument against the verse table
fn position_from(matches: &ArgMatches) -> Result<Position> {
    let raw = matches
        .get_one::<String>("position")
        .ok_or_else(|| anyhow::anyhow!("Position is required"))?;
    parse_position(raw)
}

fn parse_position(raw: &str) -> Result<Position> {
    let position: Position = raw
        .parse()
        .with_context(|| format!("Invalid position '{}'", raw))?;
    let checked = Position::within_table(u32::from(position.chapter()), u32::from(position.verse()))
        .with_context(|| format!("Invalid position '{}'", raw))?;
    Ok(checked)
}

fn print_chapter_summary(chapter: &ChapterInfo) {
    println!(
        "{:>4}. {:<20} {:<28} {:>4} verses  {}",
        chapter.number,
        style(&chapter.english_name).bold(),
        chapter.english_name_translation,
        chapter.verse_count,
        chapter.revelation_type
    );
}

fn print_chapter(detail: &ChapterDetail, translation: &[TranslatedVerse]) {
    let info = &detail.info;
    println!(
        "\n{} {} ({})",
        style(info.number).bold().cyan(),
        style(&info.english_name).bold(),
        info.name
    );
    println!(
        "{} · {} · {} verses",
        info.english_name_translation, info.revelation_type, info.verse_count
    );
    println!("{}", "=".repeat(80));

    for verse in &detail.verses {
        println!("\n[{}] {}", style(verse.number_in_chapter).dim(), verse.text);
        if let Some(translated) = translation
            .iter()
            .find(|t| t.number_in_chapter == verse.number_in_chapter)
        {
            println!("    {}", style(&translated.text).italic());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        let position = parse_position("2:255").unwrap();
        assert_eq!(position.chapter(), 2);
        assert_eq!(position.verse(), 255);
    }

    #[test]
    fn test_parse_bare_chapter() {
        assert_eq!(parse_position("36").unwrap(), Position::new(36, 1).unwrap());
    }

    #[test]
    fn test_parse_position_outside_table() {
        assert!(parse_position("1:8").is_err());
        assert!(parse_position("115:1").is_err());
        assert!(parse_position("two:one").is_err());
    }

    fn chapter_with(number: u16, verse_count: u16) -> ChapterDetail {
        ChapterDetail {
            info: ChapterInfo {
                number,
                name: String::new(),
                english_name: "Test".to_string(),
                english_name_translation: String::new(),
                verse_count,
                revelation_type: tilawah_core::RevelationType::Meccan,
            },
            verses: (1..=verse_count)
                .map(|n| Verse {
                    number: u32::from(n),
                    number_in_chapter: n,
                    text: format!("verse {}", n),
                    juz: 1,
                    chapter: number,
                })
                .collect(),
        }
    }

    #[test]
    fn test_verse_of_the_day_uses_day_index() {
        // Day 10 lands on chapter 11; 10 % 123 is index 10, verse 11
        let detail = chapter_with(11, 123);
        let (position, verse) = verse_of_the_day(&detail, 10).unwrap();
        assert_eq!(position, Position::new(11, 11).unwrap());
        assert_eq!(verse.text, "verse 11");
    }

    #[test]
    fn test_verse_of_the_day_wraps_short_chapters() {
        // Day 226: chapter 113 has 5 verses, 226 % 5 = 1
        let detail = chapter_with(113, 5);
        let (position, _) = verse_of_the_day(&detail, 226).unwrap();
        assert_eq!(position, Position::new(113, 2).unwrap());
    }

    #[test]
    fn test_verse_of_the_day_needs_the_verse_text() {
        let mut detail = chapter_with(11, 123);
        detail.verses.truncate(3);
        assert!(verse_of_the_day(&detail, 10).is_err());
    }

    #[test]
    fn test_api_client_uses_configured_endpoints() {
        let mut config = Config::default();
        config.content.api_base_url = "http://localhost:9/v1/".to_string();
        assert_eq!(api_client(&config).base_url(), "http://localhost:9/v1");
    }
}
