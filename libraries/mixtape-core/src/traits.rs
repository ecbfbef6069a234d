//! Capabilities consumed by the acquisition and playback engines
//!
//! Concrete implementations live outside the engines: the SQLite
//! repository in `mixtape-storage`, the yt-dlp resolver and the object
//! stores in the server application.

use crate::error::Result;
use crate::types::{DownloadStatus, ResolvedTrack, Track, TrackId, UserId};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// Raw audio bytes for one track, in arrival order
pub type AudioStream = BoxStream<'static, Result<Bytes>>;

/// Turns a user-submitted URL into track metadata and fetchable audio
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve a URL into zero or more tracks (a playlist yields many)
    ///
    /// # Errors
    /// `MixtapeError::Resolution` when the URL is unsupported or the
    /// backend fails
    async fn resolve(&self, url: &str) -> Result<Vec<ResolvedTrack>>;

    /// Stream the audio of a single track in the fixed output format
    ///
    /// Dropping the stream must abandon the transfer.
    ///
    /// # Errors
    /// `MixtapeError::Fetch`, either up front or as a stream item
    async fn stream_audio(&self, source_url: &str) -> Result<AudioStream>;
}

/// Durable blob store addressed by bucket and key
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (or overwrite) an object
    ///
    /// # Errors
    /// `MixtapeError::Store` when the write is rejected
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes, content_type: &str) -> Result<()>;

    /// Public URL under which a stored object is served
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Durable store of track rows
///
/// Calls for disjoint track ids must be safe to run concurrently without
/// coordination.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Get a track by ID
    async fn find_by_id(&self, id: &TrackId) -> Result<Option<Track>>;

    /// All tracks in a status, oldest first
    async fn find_by_status(&self, status: DownloadStatus) -> Result<Vec<Track>>;

    /// All tracks of an owner, newest first
    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Track>>;

    /// An owner's tracks in one status, oldest first
    async fn find_by_owner_and_status(
        &self,
        owner_id: &UserId,
        status: DownloadStatus,
    ) -> Result<Vec<Track>>;

    /// The owner's non-deleted track with this source URL, if any
    async fn find_by_owner_and_source_url(
        &self,
        owner_id: &UserId,
        source_url: &str,
    ) -> Result<Option<Track>>;

    /// Insert a new track
    ///
    /// # Errors
    /// `MixtapeError::Duplicate` when the owner already has a non-deleted
    /// track with the same source URL
    async fn insert(&self, track: &Track) -> Result<()>;

    /// Unconditionally set a track's status
    async fn update_status(&self, id: &TrackId, status: DownloadStatus) -> Result<()>;

    /// Set a track's status only if it is currently `expected`
    ///
    /// Returns whether the update was applied.
    async fn transition_status(
        &self,
        id: &TrackId,
        expected: DownloadStatus,
        next: DownloadStatus,
    ) -> Result<bool>;

    /// Increment `times_listened` by one
    async fn increment_listens(&self, id: &TrackId) -> Result<()>;

    /// Add `delta` to `upvotes`, saturating within `0..=u32::MAX`; returns the new value
    async fn adjust_upvotes(&self, id: &TrackId, delta: i64) -> Result<u32>;
}
