/// Core error types for Mirinoi Player
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `MirinoiError`
pub type Result<T> = std::result::Result<T, MirinoiError>;

/// Core error type for Mirinoi Player
#[derive(Error, Debug)]
pub enum MirinoiError {
    /// A source URL could not be turned into a playable stream
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// The engine rejected a command or is unreachable
    #[error("Engine error: {0}")]
    Engine(String),

    /// The engine never reported a started state
    #[error("Engine did not start within {0:?}")]
    EngineStartTimeout(Duration),

    /// Nothing is loaded into the engine
    #[error("No stream loaded")]
    NotLoaded,

    /// An external tool (ffplay, mpv, yt-dlp) is missing
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl MirinoiError {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a tool-unavailable error
    pub fn tool_unavailable(msg: impl Into<String>) -> Self {
        Self::ToolUnavailable(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            MirinoiError::resolution("no audio").to_string(),
            "Resolution error: no audio"
        );
        assert_eq!(
            MirinoiError::EngineStartTimeout(Duration::from_secs(5)).to_string(),
            "Engine did not start within 5s"
        );
    }

    #[test]
    fn io_conversion() {
        let err: MirinoiError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "ffplay").into();
        assert!(matches!(err, MirinoiError::Io(_)));
    }
}
