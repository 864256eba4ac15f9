//! Error types for the folder watcher.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Validation errors raised when a task is added or edited.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task has no name
    #[error("Task name must not be empty")]
    EmptyName,
    /// Width or height is zero
    #[error("Invalid dimensions {width}x{height}: width and height must be greater than 0")]
    Dimensions { width: u32, height: u32 },
    /// Output format is not one of the supported encoders
    #[error("Unsupported output format: {0}")]
    Format(String),
    /// A configured folder does not exist
    #[error("{role} folder does not exist: {path}")]
    FolderMissing { role: &'static str, path: PathBuf },
    /// Watch and output point to the same folder
    #[error("Watch and output folders cannot be the same: {0}")]
    SameFolder(PathBuf),
}

/// Main error type for the watcher.
///
/// Everything below the supervisor converts into this type; the watch loop
/// then classifies it for logging.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Task validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Source could not be opened or decoded as an image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Image could not be encoded or written
    #[error("Encode error: {0}")]
    Encode(String),

    /// Encoder reported success but the output file is absent
    #[error("Output file missing after write: {0}")]
    Verification(PathBuf),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Config could not be read or written
    #[error("Config error: {0}")]
    Config(String),

    /// No task at the given position
    #[error("No task at position {0}")]
    TaskNotFound(usize),
}

/// Convenience result type for watcher operations.
pub type FetchResult<T> = Result<T, FetchError>;

impl FetchError {
    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}

impl From<io::Error> for FetchError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
