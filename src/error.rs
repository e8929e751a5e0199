use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for project-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No version found in file: {}", relative_path(.path).display())]
    VersionNotFound { path: PathBuf },

    #[error("Empty version found in file: {}", relative_path(.path).display())]
    VersionEmpty { path: PathBuf },

    #[error(
        "Multiple inconsistent versions found in file: {}: {versions:?}",
        relative_path(.path).display()
    )]
    VersionInconsistent { path: PathBuf, versions: Vec<String> },

    #[error("Version files do not agree: {versions:?}")]
    VersionMismatch { versions: Vec<String> },

    #[error("{0}")]
    InvalidVersion(String),

    #[error("Invalid remote: '{0}'")]
    InvalidRemote(String),

    #[error("Invalid branch name: '{0}'")]
    InvalidBranch(String),

    #[error("The {0} branch does not exist locally")]
    BranchNotFound(String),

    #[error("Invalid tracking branch: {branch} is tracking {tracking} instead of {expected}")]
    TrackingMismatch {
        branch: String,
        tracking: String,
        expected: String,
    },

    #[error("Cannot update branch: {branch} and {tracking} do not share the same history")]
    UnrelatedHistory { branch: String, tracking: String },

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Cancelled by user")]
    Cancelled,
}

/// Convenience type alias for Results in project-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Whether the error comes from the user interrupting a prompt
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReleaseError::Cancelled)
    }
}

/// Get the path relative to the current directory if possible.
pub fn relative_path(path: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}
