use crate::tracks;
use async_trait::async_trait;
use mixtape_core::{
    error::Result,
    traits::TrackRepository,
    types::{DownloadStatus, Track, TrackId, UserId},
};
use sqlx::SqlitePool;

/// `TrackRepository` backed by `SQLite`
#[derive(Debug, Clone)]
pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn find_by_id(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(tracks::get_by_id(&self.pool, id).await?)
    }

    async fn find_by_status(&self, status: DownloadStatus) -> Result<Vec<Track>> {
        Ok(tracks::get_by_status(&self.pool, status).await?)
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Track>> {
        Ok(tracks::get_by_owner(&self.pool, owner_id).await?)
    }

    async fn find_by_owner_and_status(
        &self,
        owner_id: &UserId,
        status: DownloadStatus,
    ) -> Result<Vec<Track>> {
        Ok(tracks::get_by_owner_and_status(&self.pool, owner_id, status).await?)
    }

    async fn find_by_owner_and_source_url(
        &self,
        owner_id: &UserId,
        source_url: &str,
    ) -> Result<Option<Track>> {
        Ok(tracks::get_live_by_source(&self.pool, owner_id, source_url).await?)
    }

    async fn insert(&self, track: &Track) -> Result<()> {
        Ok(tracks::create(&self.pool, track).await?)
    }

    async fn update_status(&self, id: &TrackId, status: DownloadStatus) -> Result<()> {
        Ok(tracks::set_status(&self.pool, id, status).await?)
    }

    async fn transition_status(
        &self,
        id: &TrackId,
        expected: DownloadStatus,
        next: DownloadStatus,
    ) -> Result<bool> {
        Ok(tracks::compare_and_set_status(&self.pool, id, expected, next).await?)
    }

    async fn increment_listens(&self, id: &TrackId) -> Result<()> {
        Ok(tracks::increment_listens(&self.pool, id).await?)
    }

    async fn adjust_upvotes(&self, id: &TrackId, delta: i64) -> Result<u32> {
        Ok(tracks::adjust_upvotes(&self.pool, id, delta).await?)
    }
}
