//! Error types for knife-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from knife-core
    #[error(transparent)]
    Core(#[from] knife_core::Error),

    /// Error from knife-fs
    #[error(transparent)]
    Fs(#[from] knife_fs::Error),

    /// Error from knife-remote
    #[error(transparent)]
    Remote(#[from] knife_remote::StoreError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Fatal user-facing error, reported before any work is done
    #[error("{message}")]
    User { message: String },

    /// One or more paths failed; each failure has already been reported
    #[error("one or more paths failed")]
    PathsFailed,
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
