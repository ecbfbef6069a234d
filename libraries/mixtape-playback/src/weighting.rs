//! Per-track weights
//!
//! `weight = length factor * popularity factor`
//!
//! - Length: `reference / length` once a track reaches the reference
//!   duration, otherwise 1. Short tracks are never boosted.
//! - Popularity: the upvote count when positive. Without upvotes the
//!   factor decays as `decay_base ^ times_listened`, so unloved tracks
//!   fade the more they are heard.

use mixtape_core::Track;
use serde::{Deserialize, Serialize};

/// Tunables of the weighting function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Duration (seconds) from which long tracks are discounted
    pub reference_length_secs: f64,
    /// Per-listen decay of tracks without upvotes
    pub decay_base: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            reference_length_secs: 480.0,
            decay_base: 0.8,
        }
    }
}

/// Weight of `track` under `config`
pub fn weight(track: &Track, config: &WeightConfig) -> f64 {
    length_factor(track.length, config.reference_length_secs)
        * popularity_factor(track.upvotes, track.times_listened, config.decay_base)
}

fn length_factor(length: u32, reference: f64) -> f64 {
    let length = f64::from(length);
    if length >= reference {
        reference / length
    } else {
        1.0
    }
}

fn popularity_factor(upvotes: u32, times_listened: u32, decay_base: f64) -> f64 {
    if upvotes > 0 {
        f64::from(upvotes)
    } else {
        decay_base.powf(f64::from(times_listened))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mixtape_core::{DownloadStatus, TrackId, UserId};

    fn create_test_track(length: u32, upvotes: u32, times_listened: u32) -> Track {
        Track {
            id: TrackId::new("t"),
            owner_id: UserId::new("u"),
            title: "Track".to_string(),
            album: None,
            image_url: None,
            length,
            source_url: "https://example.com/t".to_string(),
            extractor: None,
            download_status: DownloadStatus::Downloaded,
            upvotes,
            times_listened,
            created_at: Utc::now(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn long_track_is_discounted() {
        let config = WeightConfig::default();
        assert_close(weight(&create_test_track(960, 0, 0), &config), 0.5);
    }

    #[test]
    fn upvotes_replace_decay() {
        let config = WeightConfig::default();
        assert_close(weight(&create_test_track(960, 10, 0), &config), 5.0);
        // Listens do not matter once upvoted
        assert_close(weight(&create_test_track(960, 10, 7), &config), 5.0);
    }

    #[test]
    fn listens_decay_unvoted_tracks() {
        let config = WeightConfig::default();
        assert_close(weight(&create_test_track(960, 0, 3), &config), 0.256);
    }

    #[test]
    fn reference_length_is_the_boundary() {
        let config = WeightConfig::default();
        assert_close(weight(&create_test_track(480, 0, 0), &config), 1.0);
        assert_close(weight(&create_test_track(479, 0, 0), &config), 1.0);
        assert_close(weight(&create_test_track(30, 0, 0), &config), 1.0);
    }

    #[test]
    fn zero_length_is_not_boosted() {
        let config = WeightConfig::default();
        assert_close(weight(&create_test_track(0, 2, 0), &config), 2.0);
    }

    #[test]
    fn decay_underflows_to_zero() {
        let config = WeightConfig::default();
        assert_eq!(weight(&create_test_track(200, 0, u32::MAX), &config), 0.0);
    }

    #[test]
    fn custom_config() {
        let config = WeightConfig {
            reference_length_secs: 100.0,
            decay_base: 0.5,
        };
        assert_close(weight(&create_test_track(400, 0, 2), &config), 0.25 * 0.25);
    }
}
