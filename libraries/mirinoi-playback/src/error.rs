//! Error types for queue and controller operations

use thiserror::Error;

/// Playback errors
///
/// The session itself never returns these: transport operations are
/// best-effort. They come from queue navigation and controller commands
/// that can be rejected outright.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {index} (queue length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Error from a core collaborator
    #[error(transparent)]
    Core(#[from] mirinoi_core::MirinoiError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
