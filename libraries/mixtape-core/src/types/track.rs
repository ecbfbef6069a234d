//! Track records and the metadata they are created from

use super::{DownloadStatus, TrackId, UserId};
use crate::error::{MixtapeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audio item owned by a user, with its download lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Also names the stored object (`{id}.mp3`)
    pub id: TrackId,
    /// User who queued the track
    pub owner_id: UserId,
    /// Display title
    pub title: String,
    /// Album name, when the source has one
    pub album: Option<String>,
    /// Thumbnail reported by the resolver
    pub image_url: Option<String>,
    /// Duration in seconds
    pub length: u32,
    /// Fetch target and per-owner dedup key
    pub source_url: String,
    /// Resolver backend that produced this track (informational)
    pub extractor: Option<String>,
    /// Where the track is in its download lifecycle
    pub download_status: DownloadStatus,
    /// Net votes, never below zero
    pub upvotes: u32,
    /// Completed listens
    pub times_listened: u32,
    /// When the track was queued
    pub created_at: DateTime<Utc>,
}

impl Track {
    /// Build a fresh `AwaitingDownload` track for `owner_id`
    pub fn from_descriptor(descriptor: TrackDescriptor, owner_id: UserId) -> Self {
        Self {
            id: TrackId::generate(),
            owner_id,
            title: descriptor.title,
            album: descriptor.album,
            image_url: descriptor.thumbnail,
            length: descriptor.length,
            source_url: descriptor.source_url,
            extractor: descriptor.extractor,
            download_status: DownloadStatus::AwaitingDownload,
            upvotes: 0,
            times_listened: 0,
            created_at: Utc::now(),
        }
    }
}

/// Raw track metadata as reported by a media resolver
///
/// Every field is optional here; [`TrackDescriptor::try_from`] decides
/// whether the entry is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    /// Display title
    pub title: Option<String>,
    /// Duration in seconds as reported (may be fractional)
    pub duration: Option<f64>,
    /// Canonical URL to fetch audio from
    pub source_url: Option<String>,
    /// Resolver backend name
    pub extractor: Option<String>,
    /// Thumbnail image URL
    pub thumbnail: Option<String>,
    /// Album name
    pub album: Option<String>,
}

/// Validated metadata for one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Non-empty display title
    pub title: String,
    /// Duration in whole seconds
    pub length: u32,
    /// Canonical URL to fetch audio from
    pub source_url: String,
    /// Resolver backend name
    pub extractor: Option<String>,
    /// Album name
    pub album: Option<String>,
    /// Thumbnail image URL
    pub thumbnail: Option<String>,
}

impl TryFrom<ResolvedTrack> for TrackDescriptor {
    type Error = MixtapeError;

    fn try_from(resolved: ResolvedTrack) -> Result<Self> {
        let source_url = resolved
            .source_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| MixtapeError::malformed("track property \"source_url\" is missing"))?;

        let title = resolved
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| {
                MixtapeError::malformed(format!("track property \"title\" is missing ({source_url})"))
            })?;

        let duration = resolved
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| {
                MixtapeError::malformed(format!(
                    "track property \"duration\" is missing ({title} {source_url})"
                ))
            })?;

        Ok(Self {
            title,
            length: duration.round().min(f64::from(u32::MAX)) as u32,
            source_url,
            extractor: resolved.extractor,
            album: resolved.album.filter(|album| !album.is_empty()),
            thumbnail: resolved.thumbnail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedTrack {
        ResolvedTrack {
            title: Some("A".to_string()),
            duration: Some(299.6),
            source_url: Some("u1".to_string()),
            extractor: Some("youtube".to_string()),
            thumbnail: Some("https://img/1.jpg".to_string()),
            album: None,
        }
    }

    #[test]
    fn descriptor_rounds_duration() {
        let descriptor = TrackDescriptor::try_from(resolved()).unwrap();
        assert_eq!(descriptor.length, 300);
        assert_eq!(descriptor.title, "A");
        assert_eq!(descriptor.source_url, "u1");
    }

    #[test]
    fn descriptor_requires_title_duration_and_source() {
        let missing_title = ResolvedTrack { title: Some("  ".into()), ..resolved() };
        let missing_duration = ResolvedTrack { duration: None, ..resolved() };
        let nan_duration = ResolvedTrack { duration: Some(f64::NAN), ..resolved() };
        let missing_source = ResolvedTrack { source_url: None, ..resolved() };

        for bad in [missing_title, missing_duration, nan_duration, missing_source] {
            let err = TrackDescriptor::try_from(bad).unwrap_err();
            assert!(matches!(err, MixtapeError::MalformedMetadata(_)), "{err}");
        }
    }

    #[test]
    fn new_track_starts_awaiting_download() {
        let descriptor = TrackDescriptor::try_from(resolved()).unwrap();
        let track = Track::from_descriptor(descriptor, UserId::new("U"));
        assert_eq!(track.download_status, DownloadStatus::AwaitingDownload);
        assert_eq!(track.owner_id, UserId::new("U"));
        assert_eq!(track.upvotes, 0);
        assert_eq!(track.times_listened, 0);
        assert_eq!(track.image_url.as_deref(), Some("https://img/1.jpg"));
    }
}
