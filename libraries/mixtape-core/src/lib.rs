//! Mixtape Core
//!
//! Shared building blocks for the mixtape track library: domain types,
//! the unified error type, and the capability traits the acquisition and
//! playback crates are written against.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `UserId`, `DownloadStatus`
//! - **Capabilities**: `MediaResolver`, `ObjectStore`, `TrackRepository`
//! - **Error Handling**: Unified `MixtapeError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use mixtape_core::types::{DownloadStatus, TrackDescriptor, Track, UserId};
//!
//! let descriptor = TrackDescriptor {
//!     title: "Intro".to_string(),
//!     length: 212,
//!     source_url: "https://example.com/watch?v=1".to_string(),
//!     extractor: Some("youtube".to_string()),
//!     album: None,
//!     thumbnail: None,
//! };
//!
//! let track = Track::from_descriptor(descriptor, UserId::new("alice"));
//! assert_eq!(track.download_status, DownloadStatus::AwaitingDownload);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod objects;
pub mod traits;
pub mod types;

pub use error::{MixtapeError, Result};
pub use traits::{AudioStream, MediaResolver, ObjectStore, TrackRepository};
pub use types::{DownloadStatus, ResolvedTrack, Track, TrackDescriptor, TrackId, UserId};
