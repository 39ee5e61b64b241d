// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tilawah_config::{Config, ConfigManager};
use tilawah_core::Timestamp;

mod commands;
mod player;

fn position_arg() -> Arg {
    Arg::new("position")
        .required(true)
        .value_name("CHAPTER:VERSE")
        .help("Verse position, e.g. 2:255")
}

fn build_cli() -> Command {
    Command::new("tilawah")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read the Quran and listen to verse-by-verse recitation")
        .subcommand(Command::new("chapters").about("List all chapters"))
        .subcommand(
            Command::new("read")
                .about("Print the verses of a chapter")
                .arg(
                    Arg::new("chapter")
                        .required(true)
                        .value_name("CHAPTER")
                        .value_parser(clap::value_parser!(u16))
                        .help("Chapter number (1-114)"),
                )
                .arg(
                    Arg::new("translation")
                        .short('t')
                        .long("translation")
                        .help("Show the configured translation even if disabled in settings")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("play")
                .about("Play recitation starting at a verse")
                .arg(
                    Arg::new("chapter")
                        .required(true)
                        .value_name("CHAPTER")
                        .value_parser(clap::value_parser!(u32))
                        .help("Chapter number (1-114)"),
                )
                .arg(
                    Arg::new("verse")
                        .value_name("VERSE")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("1")
                        .help("Verse to start from"),
                )
                .arg(
                    Arg::new("reciter")
                        .short('r')
                        .long("reciter")
                        .value_name("ID")
                        .help("Reciter for this session only, e.g. ar.husary"),
                ),
        )
        .subcommand(Command::new("resume").about("Continue from the last verse played"))
        .subcommand(
            Command::new("daily")
                .about("Show the verse of the day")
                .arg(
                    Arg::new("play")
                        .long("play")
                        .help("Start playback at the verse of the day")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("bookmarks")
                .about("Manage bookmarked verses")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List bookmarks"))
                .subcommand(
                    Command::new("add")
                        .about("Bookmark a verse")
                        .arg(position_arg()),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Remove a bookmark")
                        .arg(position_arg()),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect and change settings")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write the default config file"))
                .subcommand(Command::new("show").about("Print the effective settings"))
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(
                    Command::new("set-reciter")
                        .about("Select the reciter")
                        .arg(Arg::new("id").required(true).value_name("ID")),
                )
                .subcommand(Command::new("reset").about("Restore default settings")),
        )
}

fn init_logging(config: &Config) {
    let level = config.app.log_level.to_string();
    if env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init()
        .is_err()
    {
        eprintln!("Warning: logger already initialised");
    }
}

async fn dispatch(manager: ConfigManager, config: Config, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("chapters", _)) => commands::list_chapters(&config).await,
        Some(("read", sub_matches)) => commands::read_chapter(&config, sub_matches).await,
        Some(("play", sub_matches)) => {
            let chapter = sub_matches
                .get_one::<u32>("chapter")
                .copied()
                .ok_or_else(|| anyhow::anyhow!("Chapter is required"))?;
            let verse = sub_matches.get_one::<u32>("verse").copied().unwrap_or(1);
            let reciter = sub_matches.get_one::<String>("reciter").cloned();
            player::play(manager, config, chapter, verse, reciter).await
        }
        Some(("resume", _)) => player::resume(manager, config).await,
        Some(("daily", sub_matches)) => {
            let position = commands::daily_verse(&config, Timestamp::now().day_of_year()).await?;
            if !sub_matches.get_flag("play") {
                return Ok(());
            }
            player::play(
                manager,
                config,
                u32::from(position.chapter()),
                u32::from(position.verse()),
                None,
            )
            .await
        }
        Some(("bookmarks", sub_matches)) => commands::bookmarks(&manager, sub_matches),
        Some(("config", sub_matches)) => commands::config(&manager, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = ConfigManager::new().context("Failed to locate config directory")?;
    let config = manager
        .load_with_env_overrides()
        .unwrap_or_else(|e| {
            eprintln!("Warning: {}, using default settings", e);
            Config::default()
        });
    init_logging(&config);

    dispatch(manager, config, &matches).await
}
