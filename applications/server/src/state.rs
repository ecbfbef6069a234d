/// Shared application state
use crate::config::ServerConfig;
use crate::error::Result;
use crate::services::{object_store, LibraryService, YtDlpResolver};
use mixtape_acquisition::{AcquisitionScheduler, InFlightRegistry, Ingestion};
use mixtape_core::{MediaResolver, ObjectStore, TrackRepository};
use mixtape_storage::SqliteTrackRepository;
use std::sync::Arc;

/// Capabilities and services wired from one configuration
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub repository: Arc<dyn TrackRepository>,
    pub resolver: Arc<dyn MediaResolver>,
    pub store: Arc<dyn ObjectStore>,
    pub ingestion: Ingestion,
    pub library: LibraryService,
}

impl AppState {
    /// Open the database, run migrations and build the configured backends
    pub async fn initialize(config: ServerConfig) -> Result<Self> {
        let pool = mixtape_storage::create_pool(&config.storage.database_url).await?;
        mixtape_storage::run_migrations(&pool).await?;
        tracing::info!("Database connected");

        let repository: Arc<dyn TrackRepository> = Arc::new(SqliteTrackRepository::new(pool));
        let resolver: Arc<dyn MediaResolver> =
            Arc::new(YtDlpResolver::new(config.resolver.yt_dlp_path.clone()));
        let store = object_store::build(&config.object_store).await?;

        Ok(Self::new(config, repository, resolver, store))
    }

    pub fn new(
        config: ServerConfig,
        repository: Arc<dyn TrackRepository>,
        resolver: Arc<dyn MediaResolver>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let ingestion = Ingestion::new(Arc::clone(&repository), Arc::clone(&resolver));
        let library = LibraryService::new(
            Arc::clone(&repository),
            Arc::clone(&store),
            config.object_store.bucket.clone(),
            config.weight_config(),
        );

        Self {
            config: Arc::new(config),
            repository,
            resolver,
            store,
            ingestion,
            library,
        }
    }

    /// A scheduler over this state's capabilities with a fresh in-flight set
    pub fn scheduler(&self) -> AcquisitionScheduler {
        AcquisitionScheduler::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.resolver),
            Arc::clone(&self.store),
            self.config.acquisition_config(),
            InFlightRegistry::new(),
        )
    }
}
