use std::path::PathBuf;
use crate::utils::FetchError;

/// Everything that can go wrong inside a watch loop.
///
/// None of these stop the loop; they decide what gets logged and whether a
/// file is retried next cycle.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Watch folder is missing: {}", .0.display())]
    FolderMissing(PathBuf),

    #[error("Output folder is missing and cannot be created: {} ({})", .path.display(), .reason)]
    FolderUnwritable { path: PathBuf, reason: String },

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Encode(String),

    #[error("output file missing after write: {}", .0.display())]
    Verification(PathBuf),

    #[error("Could not remove source {file}: {reason}")]
    DeleteFailure { file: String, reason: String },

    #[error("{0}")]
    Unexpected(String),
}

pub type WatchResult<T> = Result<T, WatchError>;

impl From<FetchError> for WatchError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Decode(msg) => Self::Decode(msg),
            FetchError::Encode(msg) => Self::Encode(msg),
            FetchError::Verification(path) => Self::Verification(path),
            other => Self::Unexpected(other.to_string()),
        }
    }
}

impl From<std::io::Error> for WatchError {
    fn from(err: std::io::Error) -> Self {
        WatchError::Unexpected(format!("IO error: {err}"))
    }
}

// A panic inside a blocking conversion surfaces here.
impl From<tokio::task::JoinError> for WatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        WatchError::Unexpected(format!("conversion task failed: {err}"))
    }
}
