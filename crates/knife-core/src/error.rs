//! Error types for knife-core

use std::path::PathBuf;

/// Result type for knife-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an operation as a whole.
///
/// Per-path failures during traversal are not errors at this level; they are
/// collected into the diff and sync reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Option combination rejected before traversal starts
    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    /// Unknown letter in a diff filter
    #[error("Invalid diff filter '{filter}': unknown status '{letter}' (expected A, D, M or T)")]
    InvalidDiffFilter { filter: String, letter: char },

    /// Configuration file named explicitly but missing
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file could not be parsed
    #[error("Invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Configuration text could not be parsed
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// No server URL in configuration or on the command line
    #[error("No server URL configured. Set server_url in knife.toml or pass --server-url")]
    MissingServerUrl,

    // Transparent wrappers for underlying crate errors
    /// Entry or pattern error from knife-fs
    #[error(transparent)]
    Fs(#[from] knife_fs::Error),

    /// Remote store error from knife-remote
    #[error(transparent)]
    Remote(#[from] knife_remote::StoreError),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
