//! Mixtape Server Library
//!
//! Process wiring for the mixtape track library: configuration, the
//! yt-dlp resolver, object store backends and the owner-facing library
//! service.
//!
//! This library exposes the core components for testing purposes.

pub mod config;
pub mod error;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{FileObjectStore, LibraryService, S3ObjectStore, YtDlpResolver};
pub use state::AppState;
