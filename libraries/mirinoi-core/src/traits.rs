/// Capability traits for Mirinoi Player
use crate::error::Result;
use crate::types::EngineState;

/// A media engine that renders one stream at a time
///
/// Implementations wrap an external player (a process, an IPC peer, a
/// library handle). Every method may fail; callers treat failures as
/// best-effort and never let them escape to the user.
///
/// Methods take `&self` so the engine can be queried from a monitor thread
/// while the control surface issues commands; implementations synchronize
/// internally.
///
/// `load` and `play` must not block on stream I/O. They hand the URL over
/// (spawning a process at most) and return; readiness is observed through
/// [`Engine::state`].
pub trait Engine: Send + Sync {
    /// Hand a resolved stream URL to the engine, replacing anything loaded
    fn load(&self, url: &str) -> Result<()>;

    /// Start or resume rendering the loaded stream
    fn play(&self) -> Result<()>;

    /// Pause rendering
    fn pause(&self) -> Result<()>;

    /// Stop rendering and unload the stream
    fn stop(&self) -> Result<()>;

    /// Seek to an absolute position in milliseconds
    fn seek(&self, position_ms: u64) -> Result<()>;

    /// Elapsed position in milliseconds (may be non-positive while loading)
    fn elapsed_ms(&self) -> Result<i64>;

    /// Total duration in milliseconds (non-positive when unknown)
    fn duration_ms(&self) -> Result<i64>;

    /// Coarse engine state
    fn state(&self) -> Result<EngineState>;

    /// Set output volume (0-100)
    fn set_volume(&self, volume: u8) -> Result<()>;

    /// Output volume as reported by the engine
    ///
    /// Out-of-range values are possible (mpv allows boosting past 100).
    fn volume(&self) -> Result<i64>;

    /// Whether a paused stream can be resumed in place
    ///
    /// When this returns `false` the caller restarts the stream from its
    /// remembered position instead.
    fn is_resumable(&self) -> bool {
        true
    }
}

/// Turns an opaque source URL (a video page) into a directly playable stream URL
pub trait StreamResolver: Send + Sync {
    /// Resolve `source_url`
    ///
    /// # Errors
    /// `MirinoiError::Resolution` when no audio stream exists,
    /// `MirinoiError::ToolUnavailable` when the resolution tool is missing.
    fn resolve(&self, source_url: &str) -> Result<String>;
}
