//! Error types for knife-remote

use knife_fs::{EntryPath, Operation};

/// Result type for remote store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`RemoteStore`](crate::RemoteStore).
///
/// These are collaborator-level failures; [`RemoteEntry`](crate::RemoteEntry)
/// turns them into [`knife_fs::Error`] so tree algorithms see one taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{path}: not found")]
    NotFound { path: String },

    #[error("{path}: not a directory")]
    NotADirectory { path: String },

    #[error("{path} {reason}")]
    NotAllowed { path: String, reason: String },

    #[error("{path} must be deleted recursively")]
    MustDeleteRecursively { path: String },

    #[error("{path}: conflict: {message}")]
    Conflict { path: String, message: String },

    #[error("HTTP {status} for {path}: {body}")]
    Http {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unsupported server URL '{url}': expected http://, https:// or file://")]
    UnsupportedUrl { url: String },

    #[error(transparent)]
    Local(#[from] knife_fs::Error),
}

impl StoreError {
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub fn not_allowed(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::NotAllowed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Map into the entry error taxonomy for an operation on `path`.
    pub fn into_entry_error(self, path: &EntryPath, operation: Operation) -> knife_fs::Error {
        use knife_fs::Error;

        match self {
            Self::NotFound { .. } => Error::not_found(path),
            Self::NotADirectory { .. } => Error::NotADirectory {
                path: path.to_string(),
            },
            Self::NotAllowed { reason, .. } => Error::not_allowed(path, operation, reason),
            Self::MustDeleteRecursively { .. } => Error::MustDeleteRecursively {
                path: path.to_string(),
            },
            Self::Conflict { message, .. } => Error::failed(path, operation, message),
            Self::Http { status, body, .. } => {
                Error::failed(path, operation, format!("HTTP {status}: {body}"))
            }
            Self::Transport(e) => Error::failed(path, operation, e.to_string()),
            Self::UnsupportedUrl { url } => {
                Error::failed(path, operation, format!("unsupported server URL {url}"))
            }
            Self::Local(e) => e,
        }
    }
}
