/// Owner-scoped track actions: playlist, queue, votes and status resets
use mixtape_core::objects::audio_key;
use mixtape_core::{
    DownloadStatus, MixtapeError, ObjectStore, Result, Track, TrackId, TrackRepository, UserId,
};
use mixtape_playback::{rank, WeightConfig};
use serde::Serialize;
use std::sync::Arc;

/// One playable entry of a playlist
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistEntry {
    #[serde(flatten)]
    pub track: Track,
    pub download_url: String,
    pub weight: f64,
}

#[derive(Clone)]
pub struct LibraryService {
    repository: Arc<dyn TrackRepository>,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    weights: WeightConfig,
}

impl LibraryService {
    pub fn new(
        repository: Arc<dyn TrackRepository>,
        store: Arc<dyn ObjectStore>,
        bucket: String,
        weights: WeightConfig,
    ) -> Self {
        Self {
            repository,
            store,
            bucket,
            weights,
        }
    }

    /// The owner's downloaded tracks in weighted random order
    pub async fn playlist(&self, owner_id: &UserId) -> Result<Vec<PlaylistEntry>> {
        let downloaded = self
            .repository
            .find_by_owner_and_status(owner_id, DownloadStatus::Downloaded)
            .await?;

        let entries = rank(downloaded, &self.weights, &mut rand::thread_rng())
            .into_iter()
            .map(|ranked| PlaylistEntry {
                download_url: self.store.public_url(&self.bucket, &audio_key(&ranked.track.id)),
                weight: ranked.weight,
                track: ranked.track,
            })
            .collect();

        Ok(entries)
    }

    /// Every track of the owner, newest first
    pub async fn track_queue(&self, owner_id: &UserId) -> Result<Vec<Track>> {
        self.repository.find_by_owner(owner_id).await
    }

    pub async fn mark_listened(&self, owner_id: &UserId, id: &TrackId) -> Result<()> {
        self.owned_track(owner_id, id).await?;
        self.repository.increment_listens(id).await
    }

    /// Add `delta` to the upvotes (never below zero); returns the new count
    ///
    /// Deltas beyond what an upvote count can hold saturate.
    pub async fn vote(&self, owner_id: &UserId, id: &TrackId, delta: i64) -> Result<u32> {
        self.owned_track(owner_id, id).await?;
        let ceiling = i64::from(u32::MAX);
        self.repository
            .adjust_upvotes(id, delta.clamp(-ceiling, ceiling))
            .await
    }

    /// Mark the track deleted; the row stays as history
    pub async fn delete(&self, owner_id: &UserId, id: &TrackId) -> Result<()> {
        let track = self.owned_track(owner_id, id).await?;
        if track.download_status == DownloadStatus::Deleted {
            return Ok(());
        }

        self.repository
            .update_status(id, DownloadStatus::Deleted)
            .await?;
        tracing::info!(track_id = %id, owner_id = %owner_id, "Track deleted");
        Ok(())
    }

    /// Queue the track for download again
    ///
    /// # Errors
    /// `InvalidTransition` while the track is still awaiting download;
    /// `Duplicate` when reviving a deleted track whose source the owner
    /// has queued again since.
    pub async fn redownload(&self, owner_id: &UserId, id: &TrackId) -> Result<()> {
        let track = self.owned_track(owner_id, id).await?;
        let from = track.download_status;
        let to = DownloadStatus::AwaitingDownload;

        let invalid = || MixtapeError::InvalidTransition {
            id: id.clone(),
            from,
            to,
        };

        if !from.can_transition_to(to) {
            return Err(invalid());
        }
        if !self.repository.transition_status(id, from, to).await? {
            return Err(invalid());
        }

        tracing::info!(track_id = %id, from = %from, "Track queued for redownload");
        Ok(())
    }

    /// Fetch a track, hiding other owners' tracks as not found
    async fn owned_track(&self, owner_id: &UserId, id: &TrackId) -> Result<Track> {
        match self.repository.find_by_id(id).await? {
            Some(track) if &track.owner_id == owner_id => Ok(track),
            _ => Err(MixtapeError::track_not_found(id)),
        }
    }
}
