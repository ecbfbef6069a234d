//! Tracks currently being processed
//!
//! The registry has a single writer: the scheduler's poll loop inserts
//! ids directly and workers hand theirs back through a channel when
//! their [`InFlightGuard`] drops. Released ids are only applied by
//! [`InFlightRegistry::reap`], which the loop calls right before it reads
//! the repository. A worker records its outcome before its guard drops,
//! so by the time an id leaves the set the repository already reflects
//! the outcome and the id cannot be admitted twice.

use mixtape_core::TrackId;
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Set of in-flight track ids, owned by the poll loop
#[derive(Debug)]
pub struct InFlightRegistry {
    ids: HashSet<TrackId>,
    released_tx: mpsc::UnboundedSender<TrackId>,
    released_rx: mpsc::UnboundedReceiver<TrackId>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        let (released_tx, released_rx) = mpsc::unbounded_channel();
        Self {
            ids: HashSet::new(),
            released_tx,
            released_rx,
        }
    }

    /// Mark `id` in flight, unless it already is
    pub fn try_admit(&mut self, id: &TrackId) -> Option<InFlightGuard> {
        if !self.ids.insert(id.clone()) {
            return None;
        }

        Some(InFlightGuard {
            id: id.clone(),
            released_tx: self.released_tx.clone(),
        })
    }

    /// Apply every release handed back since the last call; returns how
    /// many ids left the set
    pub fn reap(&mut self) -> usize {
        let mut released = 0;
        while let Ok(id) = self.released_rx.try_recv() {
            if self.ids.remove(&id) {
                released += 1;
            }
        }
        released
    }

    /// Wait until at least one guard hands its id back, then reap
    pub async fn wait_released(&mut self) -> usize {
        // The registry keeps a sender, so the channel never closes here
        let Some(id) = self.released_rx.recv().await else {
            return 0;
        };
        usize::from(self.ids.remove(&id)) + self.reap()
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for InFlightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that a track is in flight; releases the id when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    id: TrackId,
    released_tx: mpsc::UnboundedSender<TrackId>,
}

impl InFlightGuard {
    pub fn track_id(&self) -> &TrackId {
        &self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // The receiver lives as long as the registry; a closed channel
        // means there is nothing left to release into.
        let _ = self.released_tx.send(self.id.clone());
    }
}
