//! Admission control for transfers
//!
//! Two limits combine: a semaphore caps how many transfers hold a slot
//! at once, and a single-cell rate limiter spaces admissions so a burst
//! of new rows does not hit the origin all at once.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Concurrency cap plus minimum inter-admission spacing
pub struct Admission {
    slots: Arc<Semaphore>,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl Admission {
    pub fn new(max_concurrent: usize, spacing: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            limiter: Quota::with_period(spacing).map(RateLimiter::direct),
        }
    }

    /// Wait for a free slot, then for the spacing window
    ///
    /// The returned permit holds the slot until dropped. `None` only if
    /// the semaphore was closed.
    pub async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        let permit = Arc::clone(&self.slots).acquire_owned().await.ok()?;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        Some(permit)
    }

    /// Slots not currently held
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

impl std::fmt::Debug for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admission")
            .field("available", &self.available())
            .field("spaced", &self.limiter.is_some())
            .finish()
    }
}
