//! Shared fakes for acquisition tests
//!
//! In-memory stand-ins for the three capabilities, with knobs for the
//! failure modes the scheduler has to survive.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use mixtape_acquisition::AcquisitionConfig;
use mixtape_core::{
    AudioStream, DownloadStatus, MediaResolver, MixtapeError, ObjectStore, ResolvedTrack, Result,
    Track, TrackId, TrackRepository, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Config with no admission spacing, so paused-clock tests never touch
/// the rate limiter's wall clock
pub fn test_config() -> AcquisitionConfig {
    AcquisitionConfig {
        bucket: "tracks".to_string(),
        max_concurrent_downloads: 4,
        admission_spacing: Duration::ZERO,
        track_timeout: Duration::from_secs(60),
        poll_interval: Duration::from_millis(800),
    }
}

/// Build a queued track directly, bypassing ingestion
pub fn queued_track(owner: &str, title: &str, source_url: &str) -> Track {
    Track {
        id: TrackId::generate(),
        owner_id: UserId::new(owner),
        title: title.to_string(),
        album: None,
        image_url: None,
        length: 300,
        source_url: source_url.to_string(),
        extractor: None,
        download_status: DownloadStatus::AwaitingDownload,
        upvotes: 0,
        times_listened: 0,
        created_at: chrono::Utc::now(),
    }
}

pub fn resolved(title: &str, duration: f64, source_url: &str) -> ResolvedTrack {
    ResolvedTrack {
        title: Some(title.to_string()),
        duration: Some(duration),
        source_url: Some(source_url.to_string()),
        extractor: Some("stub".to_string()),
        thumbnail: None,
        album: None,
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Track repository over a vector, in insertion order
#[derive(Default)]
pub struct MemoryRepository {
    tracks: Mutex<Vec<Track>>,
    failing_polls: AtomicUsize,
    polls: AtomicUsize,
    inserts_left: Mutex<Option<usize>>,
}

impl MemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tracks(tracks: Vec<Track>) -> Arc<Self> {
        let repo = Self::default();
        *repo.tracks.lock().unwrap() = tracks;
        Arc::new(repo)
    }

    /// Make the next `count` status polls fail
    pub fn fail_next_polls(&self, count: usize) {
        self.failing_polls.store(count, Ordering::SeqCst);
    }

    /// Let `count` more inserts succeed, then fail every insert
    pub fn fail_inserts_after(&self, count: usize) {
        *self.inserts_left.lock().unwrap() = Some(count);
    }

    /// Let every insert succeed again
    pub fn heal_inserts(&self) {
        *self.inserts_left.lock().unwrap() = None;
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn status_of(&self, id: &TrackId) -> DownloadStatus {
        self.get(id).download_status
    }

    pub fn get(&self, id: &TrackId) -> Track {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .expect("track exists")
    }

    pub fn set_status(&self, id: &TrackId, status: DownloadStatus) {
        let mut tracks = self.tracks.lock().unwrap();
        let track = tracks.iter_mut().find(|t| &t.id == id).expect("track exists");
        track.download_status = status;
    }

    pub fn all(&self) -> Vec<Track> {
        self.tracks.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackRepository for MemoryRepository {
    async fn find_by_id(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(self.tracks.lock().unwrap().iter().find(|t| &t.id == id).cloned())
    }

    async fn find_by_status(&self, status: DownloadStatus) -> Result<Vec<Track>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_polls.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_polls.store(failing - 1, Ordering::SeqCst);
            return Err(MixtapeError::Database("connection reset".to_string()));
        }

        Ok(self
            .tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.download_status == status)
            .cloned()
            .collect())
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Track>> {
        let mut owned: Vec<Track> = self
            .tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.owner_id == owner_id)
            .cloned()
            .collect();
        owned.reverse();
        Ok(owned)
    }

    async fn find_by_owner_and_status(
        &self,
        owner_id: &UserId,
        status: DownloadStatus,
    ) -> Result<Vec<Track>> {
        Ok(self
            .tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.owner_id == owner_id && t.download_status == status)
            .cloned()
            .collect())
    }

    async fn find_by_owner_and_source_url(
        &self,
        owner_id: &UserId,
        source_url: &str,
    ) -> Result<Option<Track>> {
        Ok(self
            .tracks
            .lock()
            .unwrap()
            .iter()
            .find(|t| {
                &t.owner_id == owner_id
                    && t.source_url == source_url
                    && t.download_status != DownloadStatus::Deleted
            })
            .cloned())
    }

    async fn insert(&self, track: &Track) -> Result<()> {
        if let Some(left) = self.inserts_left.lock().unwrap().as_mut() {
            if *left == 0 {
                return Err(MixtapeError::Database("disk I/O error".to_string()));
            }
            *left -= 1;
        }

        let mut tracks = self.tracks.lock().unwrap();
        if tracks.iter().any(|t| {
            t.owner_id == track.owner_id
                && t.source_url == track.source_url
                && t.download_status != DownloadStatus::Deleted
        }) {
            return Err(MixtapeError::Duplicate(track.source_url.clone()));
        }
        tracks.push(track.clone());
        Ok(())
    }

    async fn update_status(&self, id: &TrackId, status: DownloadStatus) -> Result<()> {
        let mut tracks = self.tracks.lock().unwrap();
        let track = tracks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| MixtapeError::track_not_found(id))?;
        track.download_status = status;
        Ok(())
    }

    async fn transition_status(
        &self,
        id: &TrackId,
        expected: DownloadStatus,
        next: DownloadStatus,
    ) -> Result<bool> {
        let mut tracks = self.tracks.lock().unwrap();
        match tracks.iter_mut().find(|t| &t.id == id) {
            Some(track) if track.download_status == expected => {
                track.download_status = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_listens(&self, id: &TrackId) -> Result<()> {
        let mut tracks = self.tracks.lock().unwrap();
        let track = tracks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| MixtapeError::track_not_found(id))?;
        track.times_listened += 1;
        Ok(())
    }

    async fn adjust_upvotes(&self, id: &TrackId, delta: i64) -> Result<u32> {
        let mut tracks = self.tracks.lock().unwrap();
        let track = tracks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| MixtapeError::track_not_found(id))?;
        let next = i64::from(track.upvotes).saturating_add(delta).max(0);
        track.upvotes = u32::try_from(next).unwrap_or(u32::MAX);
        Ok(track.upvotes)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// What `stream_audio` does for a source URL
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Yield these bytes in one chunk
    Audio(Vec<u8>),
    /// Sleep, then yield the bytes
    Slow(Duration, Vec<u8>),
    /// Never yield anything
    Hang,
    /// Fail before streaming
    Fail,
    /// Yield a chunk, then fail
    FailMidStream,
    /// Finish without yielding anything
    Empty,
}

/// Resolver with scripted resolve results and audio behaviors
#[derive(Default)]
pub struct StubResolver {
    listings: Mutex<HashMap<String, Vec<ResolvedTrack>>>,
    behaviors: Mutex<HashMap<String, Behavior>>,
    stream_calls: Mutex<Vec<String>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl StubResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn list(&self, url: &str, tracks: Vec<ResolvedTrack>) {
        self.listings.lock().unwrap().insert(url.to_string(), tracks);
    }

    pub fn behave(&self, source_url: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(source_url.to_string(), behavior);
    }

    /// How many times audio was requested for `source_url`
    pub fn stream_calls(&self, source_url: &str) -> usize {
        self.stream_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == source_url)
            .count()
    }

    /// Every source URL audio was requested for, in call order
    pub fn stream_order(&self) -> Vec<String> {
        self.stream_calls.lock().unwrap().clone()
    }

    /// Streams currently open
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of streams open at the same time
    pub fn peak_active(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Counts a stream as open until dropped
struct ActiveStream {
    active: Arc<AtomicUsize>,
}

impl ActiveStream {
    fn open(active: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self {
            active: Arc::clone(active),
        }
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaResolver for StubResolver {
    async fn resolve(&self, url: &str) -> Result<Vec<ResolvedTrack>> {
        self.listings
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| MixtapeError::resolution(format!("unsupported url {url}")))
    }

    async fn stream_audio(&self, source_url: &str) -> Result<AudioStream> {
        self.stream_calls.lock().unwrap().push(source_url.to_string());

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(source_url)
            .cloned()
            .unwrap_or_else(|| Behavior::Audio(b"ID3 stub audio".to_vec()));

        let open = ActiveStream::open(&self.active, &self.peak);

        let stream = match behavior {
            Behavior::Audio(bytes) => stream::once(async move {
                let _open = open;
                Ok::<_, MixtapeError>(Bytes::from(bytes))
            })
            .boxed(),
            Behavior::Slow(delay, bytes) => stream::once(async move {
                let _open = open;
                tokio::time::sleep(delay).await;
                Ok::<_, MixtapeError>(Bytes::from(bytes))
            })
            .boxed(),
            Behavior::Hang => stream::once(async move {
                let _open = open;
                std::future::pending::<()>().await;
                Ok::<_, MixtapeError>(Bytes::new())
            })
            .boxed(),
            Behavior::Fail => {
                drop(open);
                return Err(MixtapeError::fetch(format!("origin refused {source_url}")));
            }
            Behavior::FailMidStream => {
                drop(open);
                stream::iter(vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(MixtapeError::fetch("connection reset")),
                ])
                .boxed()
            }
            Behavior::Empty => {
                drop(open);
                stream::empty().boxed()
            }
        };

        Ok(stream)
    }
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Object store over a map keyed by `(bucket, key)`
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    failing: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MixtapeError::store("bucket unavailable"));
        }
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{bucket}/{key}")
    }
}
