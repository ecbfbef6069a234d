//! Common test utilities and fixtures
#![allow(dead_code)]

use mixtape_core::{DownloadStatus, Track, TrackId, TrackRepository, UserId};
use mixtape_playback::WeightConfig;
use mixtape_server::services::{FileObjectStore, LibraryService};
use mixtape_storage::SqliteTrackRepository;
use std::sync::Arc;
use tempfile::TempDir;

pub const BUCKET: &str = "tracks";
pub const PUBLIC_BASE: &str = "https://cdn.example.com";

/// Library service over a real SQLite file and a filesystem store
pub struct TestLibrary {
    pub repository: Arc<SqliteTrackRepository>,
    pub store: Arc<FileObjectStore>,
    pub service: LibraryService,
    pub temp_dir: TempDir,
}

impl TestLibrary {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let pool = mixtape_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");
        mixtape_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let repository = Arc::new(SqliteTrackRepository::new(pool));
        let store = Arc::new(FileObjectStore::new(
            temp_dir.path().join("objects"),
            Some(PUBLIC_BASE.to_string()),
        ));
        let service = LibraryService::new(
            repository.clone(),
            store.clone(),
            BUCKET.to_string(),
            WeightConfig::default(),
        );

        Self {
            repository,
            store,
            service,
            temp_dir,
        }
    }

    /// Insert a track with the given status and counters
    pub async fn add_track(
        &self,
        owner: &str,
        title: &str,
        status: DownloadStatus,
        upvotes: u32,
        times_listened: u32,
    ) -> Track {
        let track = Track {
            id: TrackId::generate(),
            owner_id: UserId::new(owner),
            title: title.to_string(),
            album: None,
            image_url: None,
            length: 200,
            source_url: format!("https://example.com/{owner}/{title}"),
            extractor: Some("youtube".to_string()),
            download_status: status,
            upvotes,
            times_listened,
            created_at: chrono::Utc::now(),
        };
        self.repository
            .insert(&track)
            .await
            .expect("Failed to insert track");
        track
    }

    pub async fn reload(&self, id: &TrackId) -> Track {
        self.repository
            .find_by_id(id)
            .await
            .expect("Failed to load track")
            .expect("Track exists")
    }
}
