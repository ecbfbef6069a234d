//! Queue ingestion
//!
//! Resolution and descriptor validation are all-or-nothing: a resolver
//! failure or a single malformed descriptor aborts the call before any
//! row is written. Rows are then inserted one by one, so a repository
//! failure part way through keeps the rows already written; submitting
//! the URL again queues the rest, since the written ones are skipped as
//! duplicates. Descriptors whose source the owner already has (in any
//! status but `deleted`) are skipped silently.

use mixtape_core::{
    MediaResolver, MixtapeError, Result, Track, TrackDescriptor, TrackId, TrackRepository, UserId,
};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Accepts URLs and queues their tracks for acquisition
#[derive(Clone)]
pub struct Ingestion {
    repository: Arc<dyn TrackRepository>,
    resolver: Arc<dyn MediaResolver>,
}

impl Ingestion {
    pub fn new(repository: Arc<dyn TrackRepository>, resolver: Arc<dyn MediaResolver>) -> Self {
        Self {
            repository,
            resolver,
        }
    }

    /// Resolve `url` and queue every track `owner_id` does not have yet
    ///
    /// Returns the ids of the rows created, in resolver order. Skipped
    /// duplicates are simply absent from the result.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty owner or a non-http(s) URL
    /// - `Resolution` when the resolver fails or finds nothing
    /// - `MalformedMetadata` when any descriptor lacks title, duration
    ///   or source URL
    /// - the repository's error when a lookup or insert fails; rows
    ///   inserted before the failure stay queued
    pub async fn enqueue(&self, url: &str, owner_id: &UserId) -> Result<Vec<TrackId>> {
        if owner_id.as_str().trim().is_empty() {
            return Err(MixtapeError::invalid_input("owner id must not be empty"));
        }
        let url = url.trim();
        validate_url(url)?;

        let resolved = self.resolver.resolve(url).await?;
        if resolved.is_empty() {
            return Err(MixtapeError::resolution(format!("no tracks found at {url}")));
        }

        let descriptors = resolved
            .into_iter()
            .map(TrackDescriptor::try_from)
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut accepted = Vec::new();

        for descriptor in descriptors {
            if !seen.insert(descriptor.source_url.clone()) {
                continue;
            }

            if self
                .repository
                .find_by_owner_and_source_url(owner_id, &descriptor.source_url)
                .await?
                .is_some()
            {
                tracing::info!(
                    owner_id = %owner_id,
                    source_url = %descriptor.source_url,
                    "Skipping already queued track"
                );
                continue;
            }

            let track = Track::from_descriptor(descriptor, owner_id.clone());
            match self.repository.insert(&track).await {
                Ok(()) => {
                    tracing::info!(
                        track_id = %track.id,
                        owner_id = %owner_id,
                        title = %track.title,
                        "Queued track"
                    );
                    accepted.push(track.id);
                }
                // Lost a race with a concurrent enqueue of the same source
                Err(MixtapeError::Duplicate(_)) => {
                    tracing::info!(
                        owner_id = %owner_id,
                        source_url = %track.source_url,
                        "Skipping already queued track"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(accepted)
    }
}

fn validate_url(raw: &str) -> Result<()> {
    let parsed = Url::parse(raw)
        .map_err(|e| MixtapeError::invalid_input(format!("invalid url '{raw}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        _ => Err(MixtapeError::invalid_input(format!(
            "unsupported url '{raw}': expected http or https"
        ))),
    }
}
