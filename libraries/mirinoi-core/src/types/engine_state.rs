/// Coarse engine state as reported by an `Engine`
use serde::{Deserialize, Serialize};

/// Coarse engine state
///
/// `Ended` is also reported when nothing is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// Stream handed over, not rendering yet
    Loading,
    /// Rendering audio
    Playing,
    /// Paused mid-stream
    Paused,
    /// Reached end of stream (or nothing loaded)
    Ended,
    /// The engine failed
    Error,
}

impl EngineState {
    /// Playback has started (Playing or Paused)
    pub fn is_started(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Nothing more will happen without a new load
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Error)
    }
}
