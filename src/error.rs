use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by detection, dispatch and command execution.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("No repository found at: {0}")]
    NoRepositoryFound(String),

    #[error("Unknown backend type: {0}")]
    UnknownBackendType(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("{backend} does not support '{action}'")]
    NotSupported {
        backend: &'static str,
        action: &'static str,
    },

    #[error("Invalid arguments for '{action}': {reason}")]
    InvalidArguments {
        action: &'static str,
        reason: String,
    },

    #[error("Command failed: {command} (exit code: {code:?}): {stderr}")]
    ExternalToolFailure {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command produced no output: {0}")]
    EmptyResult(String),

    #[error("Command timed out after {timeout:?}: {command}")]
    Timeout { command: String, timeout: Duration },

    #[error("Failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VcsError {
    /// Create a NoRepositoryFound error from a path
    pub fn no_repository(path: &Path) -> Self {
        Self::NoRepositoryFound(path.display().to_string())
    }

    pub fn invalid_arguments(action: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            action,
            reason: reason.into(),
        }
    }
}

pub type VcsResult<T> = Result<T, VcsError>;
