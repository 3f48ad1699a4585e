//! Mirinoi - terminal music player
//!
//! Resolves page URLs with yt-dlp and plays them through ffplay or mpv.

mod commands;
mod config;
mod error;
mod view;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use commands::{Command, SeekTarget, VolumeChange, HELP};
use config::{AppConfig, EngineKind, ResolverKind};
use mirinoi_core::{validate, Engine, StreamResolver, Track};
use mirinoi_engine::{DirectResolver, FfplayConfig, FfplayEngine, YtDlp, YtDlpResolver};
use mirinoi_playback::{PlaybackSession, PlayerController, RepeatMode, ShuffleMode};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often the loop checks for track and state changes to announce
const STATUS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "mirinoi")]
#[command(about = "Terminal music player for YouTube Music and direct streams", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./mirinoi.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Playback engine
    #[arg(short, long, global = true, value_enum)]
    engine: Option<EngineKind>,

    /// Initial volume (0-100)
    #[arg(short, long, global = true)]
    volume: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single URL or file
    Play {
        /// Page URL, stream URL, or local path
        url: String,
    },
    /// Play every entry of a playlist
    Playlist {
        /// Playlist URL
        url: String,
        /// Start shuffled
        #[arg(long)]
        shuffle: bool,
        /// Repeat mode: off, all, one
        #[arg(long, value_parser = parse_repeat)]
        repeat: Option<RepeatMode>,
    },
    /// Search YouTube and play the first hit
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
    },
}

fn parse_repeat(value: &str) -> Result<RepeatMode, String> {
    RepeatMode::from_str(value).ok_or_else(|| format!("expected off, all or one, got '{value}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(engine) = cli.engine {
        config.engine.kind = engine;
    }
    if let Some(volume) = cli.volume {
        config.playback.volume = volume;
    }
    if let Commands::Playlist { shuffle, repeat, .. } = &cli.command {
        if *shuffle {
            config.playback.shuffle = ShuffleMode::Random;
        }
        if let Some(repeat) = repeat {
            config.playback.repeat = *repeat;
        }
    }
    config.validate()?;

    init_tracing(&config);

    let ytdlp = YtDlp::new(&config.resolver.ytdlp_path);
    let tracks = fetch_tracks(cli.command, ytdlp.clone()).await?;

    let player = build_player(&config, ytdlp)?;
    player.load_tracks(&tracks);

    let first = player.play_current()?;
    tracing::info!(track = %first, "starting playback");

    run_interactive(player).await
}

fn init_tracing(config: &AppConfig) {
    // Logs go to stderr so they do not interleave with status lines
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_player(config: &AppConfig, ytdlp: YtDlp) -> anyhow::Result<Arc<PlayerController>> {
    let engine: Arc<dyn Engine> = match config.engine.kind {
        EngineKind::Ffplay => Arc::new(FfplayEngine::new(FfplayConfig {
            ffplay_path: config.engine.ffplay_path.clone(),
            ffprobe_path: config.engine.ffprobe_path.clone(),
        })),
        #[cfg(unix)]
        EngineKind::Mpv => Arc::new(mirinoi_engine::MpvEngine::new(mirinoi_engine::MpvConfig {
            mpv_path: config.engine.mpv_path.clone(),
            ..Default::default()
        })),
        #[cfg(not(unix))]
        EngineKind::Mpv => bail!("the mpv engine needs unix domain sockets"),
    };

    let resolver: Arc<dyn StreamResolver> = match config.resolver.kind {
        ResolverKind::YtDlp => Arc::new(YtDlpResolver::new(ytdlp)),
        ResolverKind::Direct => Arc::new(DirectResolver),
    };

    tracing::debug!(engine = ?config.engine.kind, resolver = ?config.resolver.kind, "player configured");

    let session = PlaybackSession::new(engine, resolver, config.playback.clone());
    Ok(PlayerController::new(session))
}

/// Turn the subcommand into a queue; extraction runs yt-dlp and blocks
async fn fetch_tracks(command: Commands, ytdlp: YtDlp) -> anyhow::Result<Vec<Track>> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Track>> {
        match command {
            Commands::Play { url } => {
                let url = url.trim().to_string();
                if !validate::is_non_empty(&url) {
                    bail!("nothing to play");
                }
                Ok(vec![Track::new(url.clone(), url)])
            }
            Commands::Playlist { url, .. } => {
                if !validate::is_valid_url(&url) {
                    bail!("'{url}' is not a URL");
                }
                let tracks = ytdlp
                    .playlist_tracks(&url)
                    .with_context(|| format!("failed to read playlist {url}"))?;
                if tracks.is_empty() {
                    bail!("playlist {url} has no playable entries");
                }
                Ok(tracks)
            }
            Commands::Search { query } => {
                let query = query.join(" ");
                match ytdlp.search_first(&query)? {
                    Some(track) => Ok(vec![track]),
                    None => bail!("no results for '{query}'"),
                }
            }
        }
    })
    .await?
}

/// Forward stdin lines from a dedicated thread
///
/// A plain thread rather than `tokio::io::stdin` so a pending read never
/// holds up runtime shutdown.
fn spawn_stdin_reader() -> anyhow::Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("mirinoi-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

async fn run_interactive(player: Arc<PlayerController>) -> anyhow::Result<()> {
    let mut lines = spawn_stdin_reader()?;
    let mut ticker = tokio::time::interval(STATUS_INTERVAL);
    let mut last_seen = None;
    let mut stdin_open = true;

    println!("type 'help' for commands");

    loop {
        tokio::select! {
            line = lines.recv(), if stdin_open => {
                // Without input, keep playing until interrupted
                let Some(line) = line else {
                    tracing::debug!("stdin closed");
                    stdin_open = false;
                    continue;
                };

                let command = match commands::parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };

                if command == Command::Quit {
                    break;
                }

                let worker = Arc::clone(&player);
                match tokio::task::spawn_blocking(move || execute(&worker, command)).await? {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(err) => println!("error: {err}"),
                }
            }
            _ = ticker.tick() => {
                let status = player.status();
                let seen = (status.index, status.state);
                if last_seen != Some(seen) {
                    last_seen = Some(seen);
                    println!("{}", view::format_status(&status));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    let worker = Arc::clone(&player);
    tokio::task::spawn_blocking(move || worker.stop()).await?;
    tracing::info!("stopped");
    Ok(())
}

/// Run one command against the player; returns text to show, if any
fn execute(player: &PlayerController, command: Command) -> anyhow::Result<Option<String>> {
    let session = player.session();

    match command {
        Command::Play => {
            player.play_current()?;
        }
        Command::Pause => player.pause(),
        Command::Toggle => player.toggle_pause()?,
        Command::Stop => player.stop(),
        Command::Next => {
            player.next()?;
        }
        Command::Prev => {
            player.previous()?;
        }
        Command::Goto(index) => {
            player.play_index(index)?;
        }
        Command::Shuffle => {
            let label = match player.toggle_shuffle() {
                ShuffleMode::Off => "shuffle off",
                ShuffleMode::Random | ShuffleMode::Smart => "shuffle on",
            };
            return Ok(Some(label.to_string()));
        }
        Command::Repeat(mode) => {
            player.set_repeat(mode);
            return Ok(Some(format!("repeat {mode}")));
        }
        Command::Volume(change) => {
            let level = match change {
                VolumeChange::Set(level) => level,
                VolumeChange::Adjust(delta) => i32::from(session.volume()) + delta,
            };
            session.set_volume(level);
            return Ok(Some(format!("volume {}", session.volume())));
        }
        Command::Mute => {
            session.toggle_mute();
            return Ok(Some(if session.is_muted() { "muted" } else { "unmuted" }.to_string()));
        }
        Command::Seek(SeekTarget::Millis(ms)) => session.seek_to(ms),
        Command::Seek(SeekTarget::Ratio(ratio)) => session.seek_to_ratio(ratio),
        Command::Status => return Ok(Some(view::format_status(&player.status()))),
        Command::List => {
            let queue = player.queue();
            let current = (!queue.is_empty()).then(|| queue.current_index());
            return Ok(Some(view::format_queue(queue.tracks(), current)));
        }
        Command::Help => return Ok(Some(HELP.to_string())),
        Command::Quit => {}
    }

    Ok(None)
}
