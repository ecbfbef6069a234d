/// Mixtape Server - background acquisition and library commands
use clap::{Parser, Subcommand};
use mixtape_core::{TrackId, UserId};
use mixtape_server::{config::ServerConfig, state::AppState, ServerError};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mixtape-server")]
#[command(about = "Mixtape track library: acquisition worker and library commands", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./mixtape.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the acquisition scheduler until Ctrl-C
    Serve,
    /// Resolve a URL and queue its tracks
    Enqueue {
        /// Owner user id
        #[arg(long)]
        owner: String,
        /// Media URL (single track or playlist)
        url: String,
    },
    /// Print the owner's downloaded tracks in playback order
    Playlist {
        #[arg(long)]
        owner: String,
    },
    /// Print every track of the owner, newest first
    Queue {
        #[arg(long)]
        owner: String,
    },
    /// Change a track's upvotes by DELTA (never below zero)
    Vote {
        #[arg(long)]
        owner: String,
        track: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Count one listen of a track
    Listened {
        #[arg(long)]
        owner: String,
        track: String,
    },
    /// Mark a track deleted
    Delete {
        #[arg(long)]
        owner: String,
        track: String,
    },
    /// Queue a track for download again
    Redownload {
        #[arg(long)]
        owner: String,
        track: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixtape_server=info,mixtape_acquisition=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let state = AppState::initialize(config).await?;

    match cli.command {
        Commands::Serve => serve(state).await?,
        Commands::Enqueue { owner, url } => {
            let ids = state.ingestion.enqueue(&url, &UserId::new(owner)).await?;
            print_json(&ids)?;
        }
        Commands::Playlist { owner } => {
            let playlist = state.library.playlist(&UserId::new(owner)).await?;
            print_json(&playlist)?;
        }
        Commands::Queue { owner } => {
            let tracks = state.library.track_queue(&UserId::new(owner)).await?;
            print_json(&tracks)?;
        }
        Commands::Vote {
            owner,
            track,
            delta,
        } => {
            let upvotes = state
                .library
                .vote(&UserId::new(owner), &TrackId::new(track), delta)
                .await?;
            println!("{upvotes}");
        }
        Commands::Listened { owner, track } => {
            state
                .library
                .mark_listened(&UserId::new(owner), &TrackId::new(track))
                .await?;
        }
        Commands::Delete { owner, track } => {
            state
                .library
                .delete(&UserId::new(owner), &TrackId::new(track))
                .await?;
        }
        Commands::Redownload { owner, track } => {
            state
                .library
                .redownload(&UserId::new(owner), &TrackId::new(track))
                .await?;
        }
    }

    Ok(())
}

async fn serve(state: AppState) -> Result<(), ServerError> {
    let acquisition = state.config.acquisition_config();
    tracing::info!("Starting Mixtape acquisition worker");
    tracing::info!("Bucket: {}", acquisition.bucket);
    tracing::info!("Max concurrent downloads: {}", acquisition.max_concurrent_downloads);

    let cancel = CancellationToken::new();
    let scheduler = state.scheduler();
    let worker = tokio::spawn(scheduler.run(cancel.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    cancel.cancel();

    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Scheduler task failed");
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ServerError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
