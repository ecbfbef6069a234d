//! Mixtape Storage
//!
//! `SQLite` persistence for mixtape track rows.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: `tracks` owns its queries; `SqliteTrackRepository`
//!   adapts them to the `TrackRepository` capability
//! - **Status as history**: deleted tracks keep their row; the per-owner
//!   source uniqueness only covers live rows
//!
//! # Example
//!
//! ```rust,no_run
//! use mixtape_core::{DownloadStatus, TrackRepository};
//! use mixtape_storage::{create_pool, run_migrations, SqliteTrackRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://mixtape.db").await?;
//! run_migrations(&pool).await?;
//!
//! let repository = SqliteTrackRepository::new(pool);
//! let queued = repository.find_by_status(DownloadStatus::AwaitingDownload).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod repository;

pub mod tracks;

pub use error::StorageError;
pub use repository::SqliteTrackRepository;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://mixtape.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
