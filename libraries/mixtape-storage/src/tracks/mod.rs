//! Track queries
//!
//! Each function takes the pool explicitly; `SqliteTrackRepository`
//! wraps them behind the `TrackRepository` trait.

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use mixtape_core::types::{DownloadStatus, Track, TrackId, UserId};
use sqlx::SqlitePool;

const TRACK_COLUMNS: &str = "id, owner_id, title, album, image_url, length, source_url, \
     extractor, download_status, upvotes, times_listened, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TrackRow {
    id: TrackId,
    owner_id: UserId,
    title: String,
    album: Option<String>,
    image_url: Option<String>,
    length: i64,
    source_url: String,
    extractor: Option<String>,
    download_status: String,
    upvotes: i64,
    times_listened: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<TrackRow> for Track {
    type Error = StorageError;

    fn try_from(row: TrackRow) -> Result<Self> {
        let download_status = row
            .download_status
            .parse::<DownloadStatus>()
            .map_err(|e| StorageError::CorruptRow(format!("track {}: {e}", row.id)))?;

        Ok(Track {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            album: row.album,
            image_url: row.image_url,
            length: to_u32(row.length),
            source_url: row.source_url,
            extractor: row.extractor,
            download_status,
            upvotes: to_u32(row.upvotes),
            times_listened: to_u32(row.times_listened),
            created_at: row.created_at,
        })
    }
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn into_tracks(rows: Vec<TrackRow>) -> Result<Vec<Track>> {
    rows.into_iter().map(Track::try_from).collect()
}

/// Get track by ID
pub async fn get_by_id(pool: &SqlitePool, id: &TrackId) -> Result<Option<Track>> {
    let row = sqlx::query_as::<_, TrackRow>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Track::try_from).transpose()
}

/// Get all tracks in a status, oldest first
pub async fn get_by_status(pool: &SqlitePool, status: DownloadStatus) -> Result<Vec<Track>> {
    let rows = sqlx::query_as::<_, TrackRow>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks
         WHERE download_status = ?
         ORDER BY created_at ASC, rowid ASC"
    ))
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;

    into_tracks(rows)
}

/// Get every track of an owner, newest first
pub async fn get_by_owner(pool: &SqlitePool, owner_id: &UserId) -> Result<Vec<Track>> {
    let rows = sqlx::query_as::<_, TrackRow>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks
         WHERE owner_id = ?
         ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    into_tracks(rows)
}

/// Get an owner's tracks in one status, oldest first
pub async fn get_by_owner_and_status(
    pool: &SqlitePool,
    owner_id: &UserId,
    status: DownloadStatus,
) -> Result<Vec<Track>> {
    let rows = sqlx::query_as::<_, TrackRow>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks
         WHERE owner_id = ? AND download_status = ?
         ORDER BY created_at ASC, rowid ASC"
    ))
    .bind(owner_id)
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;

    into_tracks(rows)
}

/// Get the owner's live (non-deleted) track for a source URL
pub async fn get_live_by_source(
    pool: &SqlitePool,
    owner_id: &UserId,
    source_url: &str,
) -> Result<Option<Track>> {
    let row = sqlx::query_as::<_, TrackRow>(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks
         WHERE owner_id = ? AND source_url = ? AND download_status <> ?
         LIMIT 1"
    ))
    .bind(owner_id)
    .bind(source_url)
    .bind(DownloadStatus::Deleted.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(Track::try_from).transpose()
}

/// Insert a track
pub async fn create(pool: &SqlitePool, track: &Track) -> Result<()> {
    sqlx::query(
        "INSERT INTO tracks (
            id, owner_id, title, album, image_url, length, source_url,
            extractor, download_status, upvotes, times_listened, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&track.id)
    .bind(&track.owner_id)
    .bind(&track.title)
    .bind(&track.album)
    .bind(&track.image_url)
    .bind(i64::from(track.length))
    .bind(&track.source_url)
    .bind(&track.extractor)
    .bind(track.download_status.as_str())
    .bind(i64::from(track.upvotes))
    .bind(i64::from(track.times_listened))
    .bind(track.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        StorageError::from_write(
            e,
            format!("{} already queued for {}", track.source_url, track.owner_id),
        )
    })?;

    Ok(())
}

/// Set a track's status unconditionally
pub async fn set_status(pool: &SqlitePool, id: &TrackId, status: DownloadStatus) -> Result<()> {
    let result = sqlx::query("UPDATE tracks SET download_status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| StorageError::from_write(e, format!("track {id} has a live duplicate")))?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Track", id.as_str()));
    }

    Ok(())
}

/// Set a track's status only if it currently equals `expected`
pub async fn compare_and_set_status(
    pool: &SqlitePool,
    id: &TrackId,
    expected: DownloadStatus,
    next: DownloadStatus,
) -> Result<bool> {
    let result =
        sqlx::query("UPDATE tracks SET download_status = ? WHERE id = ? AND download_status = ?")
            .bind(next.as_str())
            .bind(id)
            .bind(expected.as_str())
            .execute(pool)
            .await
            .map_err(|e| StorageError::from_write(e, format!("track {id} has a live duplicate")))?;

    Ok(result.rows_affected() == 1)
}

/// Record one more listen
pub async fn increment_listens(pool: &SqlitePool, id: &TrackId) -> Result<()> {
    let result = sqlx::query("UPDATE tracks SET times_listened = times_listened + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Track", id.as_str()));
    }

    Ok(())
}

/// Add `delta` to upvotes, keeping the count within `0..=u32::MAX`
pub async fn adjust_upvotes(pool: &SqlitePool, id: &TrackId, delta: i64) -> Result<u32> {
    let ceiling = i64::from(u32::MAX);
    // SQLite turns an overflowing integer sum into REAL, which no longer
    // decodes as a track row.
    let delta = delta.clamp(-ceiling, ceiling);

    let upvotes: Option<i64> = sqlx::query_scalar(
        "UPDATE tracks SET upvotes = MIN(?, MAX(0, upvotes + ?)) WHERE id = ? RETURNING upvotes",
    )
    .bind(ceiling)
    .bind(delta)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    upvotes
        .map(to_u32)
        .ok_or_else(|| StorageError::not_found("Track", id.as_str()))
}
