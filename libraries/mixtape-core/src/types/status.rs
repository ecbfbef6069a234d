//! Download lifecycle of a track

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persisted download status
///
/// `AwaitingDownload` is the only entry state. "In flight" is never
/// persisted; a track being processed stays `AwaitingDownload` until its
/// outcome is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownloadStatus {
    /// Queued; the scheduler picks it up on its next poll
    #[serde(rename = "awaiting download")]
    AwaitingDownload,
    /// Audio is in the object store
    #[serde(rename = "downloaded")]
    Downloaded,
    /// The last transfer failed or timed out
    #[serde(rename = "error")]
    Error,
    /// Removed by the owner; the row stays as history
    #[serde(rename = "deleted")]
    Deleted,
}

impl DownloadStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [DownloadStatus; 4] = [
        DownloadStatus::AwaitingDownload,
        DownloadStatus::Downloaded,
        DownloadStatus::Error,
        DownloadStatus::Deleted,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::AwaitingDownload => "awaiting download",
            DownloadStatus::Downloaded => "downloaded",
            DownloadStatus::Error => "error",
            DownloadStatus::Deleted => "deleted",
        }
    }

    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// ```text
    /// awaiting download -> downloaded | error | deleted
    /// downloaded        -> deleted | awaiting download
    /// error             -> deleted | awaiting download
    /// deleted           -> awaiting download
    /// ```
    pub fn can_transition_to(&self, next: DownloadStatus) -> bool {
        use DownloadStatus::*;
        match (self, next) {
            (AwaitingDownload, Downloaded | Error | Deleted) => true,
            (Downloaded | Error, Deleted | AwaitingDownload) => true,
            (Deleted, AwaitingDownload) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadStatus {
    type Err = crate::MixtapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DownloadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| crate::MixtapeError::invalid_input(format!("Unknown download status: {s}")))
    }
}
