use std::time::Duration;

use anyhow::{bail, Context};
use sysinfo::System;

use gemplay_sounds::audio_system::{AudioOutput, NullOutput, RodioOutput};
use gemplay_sounds::config::{app_config_dir, EngineConfig};
use gemplay_sounds::error::AppResult;
use gemplay_sounds::{GameType, PlayOutcome, SoundEngine};

const LOG_TARGET_STARTUP: &str = "gemplay_sounds::startup";

/// Longest a `play` invocation waits for its cue to finish
const PLAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Initialize tracing with file rotation
///
/// Logs are written to `<config dir>/GemPlay/logs/gemplay-sounds.YYYY-MM-DD.log`.
/// Debug builds also log to the console.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = app_config_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "gemplay-sounds.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::debug!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting gemplay-sounds v{} on {} ({})",
        env!("CARGO_PKG_VERSION"),
        os_name,
        std::env::consts::ARCH
    );
}

enum Command {
    List,
    Play {
        trigger: String,
        game_type: GameType,
        volume_multiplier: f32,
    },
    Preload,
    Settings { enabled: bool, volume: f32 },
    Help,
}

impl Command {
    fn parse(args: &[String]) -> AppResult<Self> {
        let Some(name) = args.first() else {
            return Ok(Command::Help);
        };

        match name.as_str() {
            "list" => Ok(Command::List),
            "preload" => Ok(Command::Preload),
            "play" => {
                let trigger = args.get(1).context("play needs a trigger")?.clone();
                let game_type = args
                    .get(2)
                    .map(|g| GameType::parse(g))
                    .unwrap_or_default();
                let volume_multiplier = match args.get(3) {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("Invalid volume multiplier '{}'", raw))?,
                    None => 1.0,
                };
                Ok(Command::Play {
                    trigger,
                    game_type,
                    volume_multiplier,
                })
            }
            "settings" => {
                let enabled = match args.get(1).map(String::as_str) {
                    Some("on") => true,
                    Some("off") => false,
                    other => bail!("settings needs 'on' or 'off', got {:?}", other),
                };
                let volume = args
                    .get(2)
                    .context("settings needs a volume")?
                    .parse()
                    .context("Invalid volume")?;
                Ok(Command::Settings { enabled, volume })
            }
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => bail!("Unknown command '{}'", other),
        }
    }
}

fn print_usage() {
    println!("Usage: gemplay-sounds <command>");
    println!();
    println!("  list                                   show the sound catalog");
    println!("  play <trigger> [game_type] [volume]    play one cue");
    println!("  preload                                decode critical sounds");
    println!("  settings <on|off> <volume>             change sound settings");
    println!();
    println!("Environment: GEMPLAY_API_URL, GEMPLAY_API_TOKEN, RUST_LOG");
}

fn open_output() -> Box<dyn AudioOutput> {
    match RodioOutput::new() {
        Ok(output) => Box::new(output),
        Err(e) => {
            tracing::warn!("No audio output available ({}), running silent", e);
            Box::new(NullOutput)
        }
    }
}

fn main() -> AppResult<()> {
    initialize_tracing();
    log_runtime_environment();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if let Command::Help = command {
        print_usage();
        return Ok(());
    }

    let config = EngineConfig::load().context("Failed to load engine config")?;
    let engine = SoundEngine::from_config(&config, open_output())
        .context("Failed to set up sound engine")?;
    let report = engine.init();

    match command {
        Command::List => {
            let Some(catalog) = engine.catalog() else {
                bail!("Sound catalog did not load");
            };
            println!("{} catalog, {} sounds", catalog.origin(), catalog.len());
            for trigger in catalog.triggers() {
                for def in catalog.definitions(trigger) {
                    println!(
                        "  {:<16} id={:<16} priority={:<3} volume={:.2} delay={}ms repeat={} game={} {}{}",
                        def.event_trigger,
                        def.id,
                        def.priority,
                        def.volume,
                        def.delay,
                        def.can_repeat,
                        def.game_type,
                        if def.has_audio_file { "asset" } else { "synth" },
                        if def.is_enabled { "" } else { " (disabled)" }
                    );
                }
            }
        }
        Command::Play {
            trigger,
            game_type,
            volume_multiplier,
        } => match engine.try_play(&trigger, &game_type, volume_multiplier) {
            Ok(PlayOutcome::Started { render, .. }) => {
                println!("✓ Playing {} ({:?})", trigger, render);
                engine.wait_idle(PLAY_TIMEOUT);
            }
            Ok(PlayOutcome::Scheduled { delay, .. }) => {
                println!("✓ {} starts in {:?}", trigger, delay);
                std::thread::sleep(delay + Duration::from_millis(50));
                engine.wait_idle(PLAY_TIMEOUT);
            }
            Err(e) => println!("✗ {}", e),
        },
        Command::Preload => {
            println!(
                "✓ Preloaded {} critical sounds ({} failed)",
                report.loaded, report.failed
            );
        }
        Command::Settings { enabled, volume } => {
            let settings = engine.update_settings(enabled, volume);
            println!(
                "✓ Sound {} at volume {:.2}",
                if settings.enabled { "on" } else { "off" },
                settings.volume
            );
        }
        Command::Help => print_usage(),
    }

    Ok(())
}
