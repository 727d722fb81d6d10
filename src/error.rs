use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for release-libs operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid library: {name} ({})", .path.display())]
    InvalidLibraryPath { name: String, path: PathBuf },

    #[error("Uncommitted changes found in {}", .0.display())]
    DirtyWorkingCopy(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Could not find library {library} in {}", .manifest.display())]
    ManifestEntryMissing { library: String, manifest: PathBuf },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-libs
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create an invalid input error with context
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidInput(msg.into())
    }

    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        ReleaseError::Parse(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        ReleaseError::Manifest(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a prompt error with context
    pub fn prompt(msg: impl Into<String>) -> Self {
        ReleaseError::Prompt(msg.into())
    }

    /// Create a command failure from the command line and its stderr
    pub fn command(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        ReleaseError::Command {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether this error ends the whole run instead of only the current library.
    pub fn aborts_run(&self) -> bool {
        matches!(
            self,
            ReleaseError::InvalidInput(_) | ReleaseError::InvalidLibraryPath { .. }
        )
    }
}

impl From<serde_json::Error> for ReleaseError {
    fn from(err: serde_json::Error) -> Self {
        ReleaseError::Manifest(err.to_string())
    }
}

impl From<dialoguer::Error> for ReleaseError {
    fn from(err: dialoguer::Error) -> Self {
        ReleaseError::Prompt(err.to_string())
    }
}
