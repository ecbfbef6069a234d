//! Core error types for mixtape

use crate::types::{DownloadStatus, TrackId};
use thiserror::Error;

/// Result type alias using `MixtapeError`
pub type Result<T> = std::result::Result<T, MixtapeError>;

/// Core error type for mixtape
#[derive(Error, Debug)]
pub enum MixtapeError {
    /// The media resolver could not turn a URL into track metadata
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// The resolver returned a descriptor without a required field
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    /// Fetching audio bytes failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Writing to the object store failed
    #[error("Store error: {0}")]
    Store(String),

    /// An operation did not finish before its deadline
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up
        entity: String,
        /// Identifier that matched nothing
        id: String,
    },

    /// Status change that the download state machine does not allow
    #[error("Track {id} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        /// Track the change was requested for
        id: TrackId,
        /// Current status
        from: DownloadStatus,
        /// Requested status
        to: DownloadStatus,
    },

    /// Duplicate entry
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database errors (for repository implementations)
    #[error("Database error: {0}")]
    Database(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl MixtapeError {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a malformed metadata error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMetadata(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a track not found error
    pub fn track_not_found(id: &TrackId) -> Self {
        Self::not_found("Track", id.as_str())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error belongs to a single track's transfer
    /// (fetch, store or deadline) rather than to the caller's request.
    pub fn is_transfer_failure(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Store(_) | Self::Timeout(_))
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for MixtapeError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
