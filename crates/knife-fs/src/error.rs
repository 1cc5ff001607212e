//! Error types for knife-fs

use std::path::PathBuf;

/// Result type for knife-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by patterns and entries.
///
/// Entry errors carry the display path of the entry they concern so callers
/// can report them per path and keep going.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{path}: No such file or directory")]
    NotFound { path: String },

    #[error("{path}: Not a directory")]
    NotADirectory { path: String },

    #[error("{path} {reason}")]
    OperationNotAllowed {
        path: String,
        operation: Operation,
        reason: String,
    },

    #[error("{path} must be deleted recursively")]
    MustDeleteRecursively { path: String },

    #[error("{path} failed to {operation}: {message}")]
    OperationFailed {
        path: String,
        operation: Operation,
        message: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The entry operation an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Read,
    Write,
    CreateDir,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Write => "write",
            Self::CreateDir => "create",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub fn not_allowed(path: impl ToString, operation: Operation, reason: impl Into<String>) -> Self {
        Self::OperationNotAllowed {
            path: path.to_string(),
            operation,
            reason: reason.into(),
        }
    }

    pub fn failed(path: impl ToString, operation: Operation, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            path: path.to_string(),
            operation,
            message: message.into(),
        }
    }

    /// True for the "entry is absent" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
