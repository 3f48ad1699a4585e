/// Application configuration
use crate::error::{CliError, Result};
use mirinoi_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory
const DEFAULT_CONFIG_FILE: &str = "mirinoi.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub resolver: ResolverSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// One ffplay process per play
    #[default]
    Ffplay,
    /// mpv over JSON IPC
    Mpv,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub kind: EngineKind,

    #[serde(default = "default_ffplay_path")]
    pub ffplay_path: PathBuf,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    #[serde(default = "default_mpv_path")]
    pub mpv_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ResolverKind {
    #[default]
    #[serde(rename = "yt-dlp")]
    YtDlp,
    #[serde(rename = "direct")]
    Direct,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default)]
    pub kind: ResolverKind,

    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `mirinoi.toml` in the working
    /// directory is used if present. `MIRINOI_` variables override both,
    /// with `__` between section and key (`MIRINOI_ENGINE__KIND=mpv`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        let config = settings.add_source(env).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.volume > 100 {
            return Err(CliError::Config(format!(
                "playback.volume must be 0-100, got {}",
                self.playback.volume
            )));
        }

        if self.playback.poll_interval_ms == 0 {
            return Err(CliError::Config(
                "playback.poll_interval_ms must be positive".to_string(),
            ));
        }

        if self.playback.startup_timeout_ms == 0 {
            return Err(CliError::Config(
                "playback.startup_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            resolver: ResolverSettings::default(),
            playback: PlaybackConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            ffplay_path: default_ffplay_path(),
            ffprobe_path: default_ffprobe_path(),
            mpv_path: default_mpv_path(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            kind: ResolverKind::default(),
            ytdlp_path: default_ytdlp_path(),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("MIRINOI")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

// Default values
fn default_log_filter() -> String {
    "mirinoi=info,mirinoi_playback=info,mirinoi_engine=info".to_string()
}

fn default_ffplay_path() -> PathBuf {
    PathBuf::from("ffplay")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_mpv_path() -> PathBuf {
    PathBuf::from("mpv")
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}
