//! Background acquisition scheduler
//!
//! The poll loop reads `awaiting download` rows, marks each unseen id in
//! flight and queues it. A single dispatcher task takes the queue in
//! order, waits for [`Admission`] and only then spawns a worker, so
//! tracks are admitted in the order the repository returned them. A
//! worker races fetch-and-store against the per-track deadline and
//! records `downloaded` or `error` with a conditional update, so a
//! status a user set in the meantime is left alone.
//!
//! Errors are never retried here. A track in `error` stays there until
//! someone moves it back to `awaiting download`.

use crate::admission::Admission;
use crate::config::AcquisitionConfig;
use crate::in_flight::{InFlightGuard, InFlightRegistry};
use crate::transfer::fetch_and_store;
use mixtape_core::{
    DownloadStatus, MediaResolver, MixtapeError, ObjectStore, Result, Track, TrackRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// How one admitted track ended
#[derive(Debug)]
pub enum Outcome {
    /// Audio stored under `key`
    Downloaded { key: String },
    /// Fetch or store failed, or the deadline elapsed
    Failed(MixtapeError),
    /// Shutdown interrupted the track; its status is left as is
    Interrupted,
}

impl Outcome {
    /// Status to record, if any
    pub fn status(&self) -> Option<DownloadStatus> {
        match self {
            Self::Downloaded { .. } => Some(DownloadStatus::Downloaded),
            Self::Failed(_) => Some(DownloadStatus::Error),
            Self::Interrupted => None,
        }
    }
}

/// A track waiting for its admission turn
struct Queued {
    track: Track,
    guard: InFlightGuard,
}

/// State shared by every worker
struct Worker {
    repository: Arc<dyn TrackRepository>,
    resolver: Arc<dyn MediaResolver>,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    track_timeout: Duration,
}

impl Worker {
    async fn process(&self, queued: Queued, permit: OwnedSemaphorePermit, cancel: CancellationToken) {
        let Queued { track, guard } = queued;

        let outcome = self.transfer(&track, &cancel).await;
        drop(permit);
        self.record(&track, &outcome).await;

        // Only now may the poll loop see the id as free again
        drop(guard);
    }

    async fn transfer(&self, track: &Track, cancel: &CancellationToken) -> Outcome {
        let transfer = fetch_and_store(
            self.resolver.as_ref(),
            self.store.as_ref(),
            &self.bucket,
            track,
        );

        // Dropping the losing branch drops the transfer future, which
        // drops the resolver stream and abandons the fetch.
        tokio::select! {
            biased;
            () = cancel.cancelled() => Outcome::Interrupted,
            result = tokio::time::timeout(self.track_timeout, transfer) => match result {
                Ok(Ok(key)) => Outcome::Downloaded { key },
                Ok(Err(e)) => Outcome::Failed(e),
                Err(_) => Outcome::Failed(MixtapeError::Timeout(self.track_timeout)),
            },
        }
    }

    async fn record(&self, track: &Track, outcome: &Outcome) {
        match outcome {
            Outcome::Downloaded { key } => {
                tracing::info!(track_id = %track.id, key = %key, "Track downloaded");
            }
            Outcome::Failed(e) if e.is_transfer_failure() => {
                tracing::warn!(track_id = %track.id, error = %e, "Track download failed");
            }
            Outcome::Failed(e) => {
                tracing::error!(track_id = %track.id, error = %e, "Track download failed unexpectedly");
            }
            Outcome::Interrupted => {
                tracing::info!(track_id = %track.id, "Track interrupted by shutdown");
            }
        }

        let Some(next) = outcome.status() else {
            return;
        };

        match self
            .repository
            .transition_status(&track.id, DownloadStatus::AwaitingDownload, next)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::info!(
                track_id = %track.id,
                status = %next,
                "Track status changed while in flight; outcome discarded"
            ),
            Err(e) => tracing::error!(
                track_id = %track.id,
                status = %next,
                error = %e,
                "Failed to record track outcome"
            ),
        }
    }
}

/// Admits queued tracks one at a time, in queue order
struct Dispatcher {
    worker: Arc<Worker>,
    admission: Admission,
    queue: mpsc::UnboundedReceiver<Queued>,
    workers: JoinSet<()>,
    cancel: CancellationToken,
}

impl Dispatcher {
    async fn run(mut self) {
        while let Some(queued) = self.next().await {
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                permit = self.admission.admit() => permit,
            };
            let Some(permit) = permit else {
                break;
            };

            tracing::debug!(
                track_id = %queued.track.id,
                source_url = %queued.track.source_url,
                "Admitted track"
            );

            let worker = Arc::clone(&self.worker);
            let cancel = self.cancel.child_token();
            self.workers
                .spawn(async move { worker.process(queued, permit, cancel).await });
        }

        self.stop().await;
    }

    /// Next queued track, collecting finished workers while idle
    async fn next(&mut self) -> Option<Queued> {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return None,
                Some(result) = self.workers.join_next(), if !self.workers.is_empty() => log_join(result),
                queued = self.queue.recv() => return queued,
            }
        }
    }

    async fn stop(mut self) {
        // Tracks still waiting for a turn keep `awaiting download`;
        // dropping them releases their in-flight ids.
        self.queue.close();
        let mut skipped = 0;
        while self.queue.try_recv().is_ok() {
            skipped += 1;
        }
        if skipped > 0 {
            tracing::info!(skipped, "Queued tracks left for the next run");
        }

        while let Some(result) = self.workers.join_next().await {
            log_join(result);
        }
    }
}

/// Polls for queued tracks and downloads them in the background
pub struct AcquisitionScheduler {
    repository: Arc<dyn TrackRepository>,
    in_flight: InFlightRegistry,
    queue: mpsc::UnboundedSender<Queued>,
    dispatcher: JoinHandle<()>,
    poll_interval: Duration,
    max_concurrent: usize,
    track_timeout: Duration,
    cancel: CancellationToken,
}

impl AcquisitionScheduler {
    /// Build the scheduler and start its dispatcher
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn new(
        repository: Arc<dyn TrackRepository>,
        resolver: Arc<dyn MediaResolver>,
        store: Arc<dyn ObjectStore>,
        config: AcquisitionConfig,
        in_flight: InFlightRegistry,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (queue, queue_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher {
            worker: Arc::new(Worker {
                repository: Arc::clone(&repository),
                resolver,
                store,
                bucket: config.bucket,
                track_timeout: config.track_timeout,
            }),
            admission: Admission::new(config.max_concurrent_downloads, config.admission_spacing),
            queue: queue_rx,
            workers: JoinSet::new(),
            cancel: cancel.clone(),
        };

        Self {
            repository,
            in_flight,
            queue,
            dispatcher: tokio::spawn(dispatcher.run()),
            poll_interval: config.poll_interval,
            max_concurrent: config.max_concurrent_downloads,
            track_timeout: config.track_timeout,
            cancel,
        }
    }

    /// One poll cycle; returns how many tracks were queued for admission
    ///
    /// # Errors
    /// Propagates a repository failure from the poll, in which case
    /// nothing is queued, or reports a dispatcher that has stopped.
    pub async fn poll_once(&mut self) -> Result<usize> {
        self.in_flight.reap();

        let queued = self
            .repository
            .find_by_status(DownloadStatus::AwaitingDownload)
            .await?;

        let mut dispatched = 0;
        for track in queued {
            let Some(guard) = self.in_flight.try_admit(&track.id) else {
                continue;
            };

            self.queue
                .send(Queued { track, guard })
                .map_err(|_| MixtapeError::Other("acquisition dispatcher has stopped".to_string()))?;
            dispatched += 1;
        }

        if dispatched > 0 {
            tracing::debug!(dispatched, in_flight = self.in_flight.len(), "Queued tracks");
        }

        Ok(dispatched)
    }

    /// Wait until every queued or running track has been released
    pub async fn wait_idle(&mut self) {
        self.in_flight.reap();
        while !self.in_flight.is_empty() {
            self.in_flight.wait_released().await;
        }
    }

    /// Ids currently marked in flight (as of the last reap)
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Poll until `cancel` fires, then stop workers and wait for them
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval = ?self.poll_interval,
            max_concurrent = self.max_concurrent,
            track_timeout = ?self.track_timeout,
            "Acquisition scheduler started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        tracing::error!(error = %e, "Acquisition poll failed");
                    }
                }
            }
        }

        self.shutdown().await;
    }

    /// Interrupt in-flight transfers and wait for their workers
    ///
    /// Interrupted and not-yet-admitted tracks keep `awaiting download`
    /// and are picked up again by the next scheduler to run.
    pub async fn shutdown(mut self) {
        tracing::info!(in_flight = self.in_flight.len(), "Stopping acquisition scheduler");

        self.cancel.cancel();
        if let Err(e) = (&mut self.dispatcher).await {
            tracing::error!(error = %e, "Acquisition dispatcher panicked");
        }
        self.in_flight.reap();

        tracing::info!("Acquisition scheduler stopped");
    }
}

fn log_join(result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Acquisition worker panicked");
    }
}
