use thiserror::Error;

/// Unified error type for changeset-autopilot operations
#[derive(Error, Debug)]
pub enum AutopilotError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Release creation failed: {0}")]
    Release(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in changeset-autopilot
pub type Result<T> = std::result::Result<T, AutopilotError>;

impl AutopilotError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        AutopilotError::Config(msg.into())
    }

    /// Create a workspace error with context
    pub fn workspace(msg: impl Into<String>) -> Self {
        AutopilotError::Workspace(msg.into())
    }

    /// Create a command error with context
    pub fn command(msg: impl Into<String>) -> Self {
        AutopilotError::Command(msg.into())
    }

    /// Create a release error with context
    pub fn release(msg: impl Into<String>) -> Self {
        AutopilotError::Release(msg.into())
    }
}
