/// Error types for external tools
use mirinoi_core::MirinoiError;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using `EngineError`
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors from running and talking to external tools
#[derive(Error, Debug)]
pub enum EngineError {
    /// The program is not installed (or not on PATH)
    #[error("{program} not found; is it installed and on PATH?")]
    ToolMissing { program: String },

    /// The program exists but could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program ran and reported failure
    #[error("{program} failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The program's output could not be used
    #[error("Unexpected output from {program}: {detail}")]
    Output { program: String, detail: String },

    /// IPC conversation with a running player failed
    #[error("IPC error: {0}")]
    Ipc(String),

    /// No stream loaded
    #[error("No stream loaded")]
    NotLoaded,

    /// I/O errors
    #[error(transparent)]
    Io(#[from] io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Classify a spawn failure
    pub(crate) fn spawn(program: &Path, source: io::Error) -> Self {
        let program = program.display().to_string();
        if source.kind() == io::ErrorKind::NotFound {
            Self::ToolMissing { program }
        } else {
            Self::Spawn { program, source }
        }
    }

    pub(crate) fn output(program: &Path, detail: impl Into<String>) -> Self {
        Self::Output {
            program: program.display().to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn ipc(msg: impl Into<String>) -> Self {
        Self::Ipc(msg.into())
    }
}

impl From<EngineError> for MirinoiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ToolMissing { .. } => MirinoiError::tool_unavailable(err.to_string()),
            EngineError::NotLoaded => MirinoiError::NotLoaded,
            EngineError::Io(err) => MirinoiError::Io(err),
            other => MirinoiError::engine(other.to_string()),
        }
    }
}
