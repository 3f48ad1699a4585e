//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing playing
    #[default]
    Stopped,

    /// Currently playing (or starting up)
    Playing,

    /// Paused mid-track
    Paused,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }

    /// Parse from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "all" => Some(Self::All),
            "one" => Some(Self::One),
            _ => None,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMode {
    /// No shuffling
    #[default]
    Off,

    /// Pure random shuffle
    Random,

    /// Smart shuffle (spread artists apart)
    Smart,
}

/// Configuration for playback session and controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 20)
    pub volume: u8,

    /// Monitor poll interval (default: 250ms)
    pub poll_interval_ms: u64,

    /// How long the engine may take to report a started state (default: 5s)
    pub startup_timeout_ms: u64,

    /// Delay before seeking to a resume offset (default: 300ms)
    pub resume_grace_ms: u64,

    /// Consecutive failed state queries tolerated by the monitor (default: 3)
    pub max_poll_failures: u32,

    /// Initial shuffle mode (default: Off)
    pub shuffle: ShuffleMode,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,
}

impl PlaybackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn resume_grace(&self) -> Duration {
        Duration::from_millis(self.resume_grace_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 20,
            poll_interval_ms: 250,
            startup_timeout_ms: 5000,
            resume_grace_ms: 300,
            max_poll_failures: 3,
            shuffle: ShuffleMode::Off,
            repeat: RepeatMode::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.volume, 20);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.startup_timeout(), Duration::from_secs(5));
        assert_eq!(config.shuffle, ShuffleMode::Off);
        assert_eq!(config.repeat, RepeatMode::Off);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{"volume": 55, "repeat": "all"}"#).unwrap();
        assert_eq!(config.volume, 55);
        assert_eq!(config.repeat, RepeatMode::All);
        assert_eq!(config.poll_interval_ms, 250);
    }

    #[test]
    fn repeat_mode_round_trip_strings() {
        for mode in [RepeatMode::Off, RepeatMode::All, RepeatMode::One] {
            assert_eq!(RepeatMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(RepeatMode::from_str("sometimes"), None);
    }
}
