use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while finding or writing covers.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// The directory does not exist.
    #[error("directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The process may not read the directory.
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Any other filesystem failure.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The metadata service timed out, was unreachable or returned 5xx.
    #[error("metadata service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The metadata service answered 429.
    #[error("metadata service rate limit exceeded")]
    RateLimited {
        /// How long the service asked us to wait.
        retry_after: Option<Duration>,
    },

    /// The metadata service rejected the API key.
    #[error("invalid metadata service API key")]
    InvalidApiKey,

    /// No record with the requested id.
    #[error("metadata record not found: {0}")]
    MetadataNotFound(String),

    /// Any other error status from the metadata service.
    #[error("metadata service error: {0}")]
    Api(String),

    /// The metadata service sent a body that could not be decoded.
    #[error("unexpected metadata response: {0}")]
    Parse(String),

    /// Artwork could not be downloaded.
    #[error("failed to fetch artwork: {0}")]
    Fetch(String),

    /// The cover could not be stored.
    #[error("failed to write cover {}: {source}", path.display())]
    Write {
        /// Cover path being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Downloaded artwork could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A bug or a failed background task.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ScoutError {
    /// Map a filesystem error for `path` onto the directory-level variants.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(path.to_path_buf())
            }
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Errors worth retrying after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::RateLimited { .. }
        )
    }
}

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, ScoutError>;
