//! Error types for media operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while inspecting or remuxing media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("Failed to run {program}: {message}")]
    Subprocess { program: String, message: String },

    #[error("{program} exited with non-zero status {exit_code:?}")]
    ProcessFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("FFprobe failed: {0}")]
    Probe(#[source] Box<MediaError>),

    #[error("Invalid FFprobe output: {0}")]
    Parse(String),

    #[error("Faststart remux failed: {0}")]
    Remux(#[source] Box<MediaError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn subprocess(program: impl Into<String>, message: impl ToString) -> Self {
        Self::Subprocess {
            program: program.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn probe(source: MediaError) -> Self {
        Self::Probe(Box::new(source))
    }

    pub fn remux(source: MediaError) -> Self {
        Self::Remux(Box::new(source))
    }

    /// Whether this is a failure to start, finish or bound a subprocess.
    pub fn is_subprocess_failure(&self) -> bool {
        matches!(
            self,
            MediaError::ToolNotFound(_)
                | MediaError::Subprocess { .. }
                | MediaError::ProcessFailed { .. }
                | MediaError::Timeout { .. }
        )
    }
}
