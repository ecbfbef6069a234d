/// Server error types
use mixtape_core::MixtapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Library(MixtapeError),

    #[error("Storage error: {0}")]
    Storage(#[from] mixtape_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<MixtapeError> for ServerError {
    fn from(err: MixtapeError) -> Self {
        match err {
            MixtapeError::NotFound { entity, id } => {
                ServerError::NotFound(format!("{entity} {id}"))
            }
            MixtapeError::InvalidInput(msg) => ServerError::BadRequest(msg),
            other => ServerError::Library(other),
        }
    }
}

impl ServerError {
    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ServerError::NotFound(_) | ServerError::BadRequest(_) => 2,
            ServerError::Config(_) => 78,
            ServerError::Library(e) if matches!(e, MixtapeError::InvalidTransition { .. }) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixtape_core::{DownloadStatus, TrackId};

    #[test]
    fn not_found_maps_to_not_found() {
        let err: ServerError = MixtapeError::track_not_found(&TrackId::new("t1")).into();
        assert!(matches!(err, ServerError::NotFound(ref msg) if msg == "Track t1"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let err: ServerError = MixtapeError::invalid_input("bad url").into();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[test]
    fn other_library_errors_pass_through() {
        let err: ServerError = MixtapeError::InvalidTransition {
            id: TrackId::new("t1"),
            from: DownloadStatus::AwaitingDownload,
            to: DownloadStatus::AwaitingDownload,
        }
        .into();
        assert!(matches!(err, ServerError::Library(_)));
        assert_eq!(err.exit_code(), 2);

        let err: ServerError = MixtapeError::resolution("unsupported").into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Resolution error: unsupported");
    }
}
