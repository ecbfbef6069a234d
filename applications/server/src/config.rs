/// Server configuration
use crate::error::{Result, ServerError};
use mixtape_acquisition::AcquisitionConfig;
use mixtape_playback::WeightConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_object_store")]
    pub object_store: ObjectStoreSettings,

    #[serde(default = "default_resolver")]
    pub resolver: ResolverSettings,

    #[serde(default = "default_acquisition")]
    pub acquisition: AcquisitionSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreBackend {
    S3,
    Filesystem,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectStoreSettings {
    #[serde(default = "default_backend")]
    pub backend: ObjectStoreBackend,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// S3 host; endpoint is `https://{domain}`
    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Filesystem backend root
    #[serde(default = "default_object_root")]
    pub root: PathBuf,

    /// Filesystem backend URL prefix (defaults to `file://{root}`)
    #[serde(default)]
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionSettings {
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    #[serde(default = "default_admission_spacing_ms")]
    pub admission_spacing_ms: u64,

    #[serde(default = "default_track_timeout_secs")]
    pub track_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_reference_length_secs")]
    pub reference_length_secs: f64,

    #[serde(default = "default_decay_base")]
    pub decay_base: f64,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `mixtape.toml` in the working directory; a
    /// missing default file is fine, a missing explicit one is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    /// Same as [`ServerConfig::load`] with an explicit environment source
    pub fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("mixtape.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (MIXTAPE_SECTION__KEY)
        settings = settings.add_source(env);

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let acquisition = &self.acquisition;
        if acquisition.max_concurrent_downloads == 0 {
            return Err(ServerError::Config(
                "acquisition.max_concurrent_downloads must be at least 1".to_string(),
            ));
        }
        if acquisition.track_timeout_secs == 0 {
            return Err(ServerError::Config(
                "acquisition.track_timeout_secs must be at least 1".to_string(),
            ));
        }
        if acquisition.poll_interval_ms == 0 {
            return Err(ServerError::Config(
                "acquisition.poll_interval_ms must be at least 1".to_string(),
            ));
        }

        let playback = &self.playback;
        if !(playback.reference_length_secs.is_finite() && playback.reference_length_secs > 0.0) {
            return Err(ServerError::Config(format!(
                "playback.reference_length_secs must be positive, got {}",
                playback.reference_length_secs
            )));
        }
        if !(playback.decay_base > 0.0 && playback.decay_base <= 1.0) {
            return Err(ServerError::Config(format!(
                "playback.decay_base must be in (0, 1], got {}",
                playback.decay_base
            )));
        }

        let store = &self.object_store;
        if store.bucket.trim().is_empty() {
            return Err(ServerError::Config(
                "object_store.bucket must not be empty".to_string(),
            ));
        }
        if store.backend == ObjectStoreBackend::S3 {
            if is_blank(store.domain.as_deref()) {
                return Err(ServerError::Config(
                    "object_store.domain is required for the s3 backend (set MIXTAPE_OBJECT_STORE__DOMAIN)"
                        .to_string(),
                ));
            }
            if is_blank(store.access_key_id.as_deref())
                || is_blank(store.secret_access_key.as_deref())
            {
                return Err(ServerError::Config(
                    "object_store.access_key_id and object_store.secret_access_key are required for the s3 backend"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Scheduler limits for the configured bucket
    pub fn acquisition_config(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            bucket: self.object_store.bucket.clone(),
            max_concurrent_downloads: self.acquisition.max_concurrent_downloads,
            admission_spacing: Duration::from_millis(self.acquisition.admission_spacing_ms),
            track_timeout: Duration::from_secs(self.acquisition.track_timeout_secs),
            poll_interval: Duration::from_millis(self.acquisition.poll_interval_ms),
        }
    }

    pub fn weight_config(&self) -> WeightConfig {
        WeightConfig {
            reference_length_secs: self.playback.reference_length_secs,
            decay_base: self.playback.decay_base,
        }
    }
}

/// `MIXTAPE_` variables, `__` between section and key
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("MIXTAPE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).unwrap_or_default().is_empty()
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/mixtape.db".to_string()
}

fn default_object_store() -> ObjectStoreSettings {
    ObjectStoreSettings {
        backend: default_backend(),
        bucket: default_bucket(),
        domain: None,
        region: default_region(),
        access_key_id: None,
        secret_access_key: None,
        root: default_object_root(),
        public_base_url: None,
    }
}

fn default_backend() -> ObjectStoreBackend {
    ObjectStoreBackend::Filesystem
}

fn default_bucket() -> String {
    "tracks".to_string()
}

fn default_region() -> String {
    "eu-central-003".to_string()
}

fn default_object_root() -> PathBuf {
    PathBuf::from("./data/objects")
}

fn default_resolver() -> ResolverSettings {
    ResolverSettings {
        yt_dlp_path: default_yt_dlp_path(),
    }
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_acquisition() -> AcquisitionSettings {
    AcquisitionSettings {
        max_concurrent_downloads: default_max_concurrent_downloads(),
        admission_spacing_ms: default_admission_spacing_ms(),
        track_timeout_secs: default_track_timeout_secs(),
        poll_interval_ms: default_poll_interval_ms(),
    }
}

fn default_max_concurrent_downloads() -> usize {
    30
}

fn default_admission_spacing_ms() -> u64 {
    200
}

fn default_track_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    800
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        reference_length_secs: default_reference_length_secs(),
        decay_base: default_decay_base(),
    }
}

fn default_reference_length_secs() -> f64 {
    480.0
}

fn default_decay_base() -> f64 {
    0.8
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            object_store: default_object_store(),
            resolver: default_resolver(),
            acquisition: default_acquisition(),
            playback: default_playback(),
        }
    }
}
