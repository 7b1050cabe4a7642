// src/error.rs

//! Error types for recipe evaluation and cooking

use thiserror::Error;

/// Errors raised while evaluating or cooking a recipe
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem or process I/O failure
    #[error("I/O error: {0}")]
    IoError(String),

    /// Malformed recipe, profile, or command-line value
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Source download failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Downloaded archive does not match its pinned checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// A required file, directory, or tool is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// The external build generator reported a failure
    #[error("{phase} phase failed: {message}")]
    BuildError { phase: String, message: String },

    /// Reference to an option the recipe does not declare (or has removed)
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Reference to an unknown or removed setting
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Failed to set up a client or tool
    #[error("Initialization error: {0}")]
    InitError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

/// Result alias for recipe operations
pub type Result<T> = std::result::Result<T, Error>;
