//! Weighted shuffle
//!
//! Single-pass weighted permutation: every track draws `u` uniformly
//! from `(0, 1)` and gets the key `u ^ (W / w)`, where `w` is its weight
//! and `W` the total. Sorting by key, highest first, puts a track first
//! with probability `w / W`, and the same holds for every later position
//! among the tracks that remain.
//!
//! Keys are compared as `ln(u) * W / w`, the logarithm of the same
//! value, which keeps tiny weights from underflowing every key to 0.

use crate::weighting::{weight, WeightConfig};
use mixtape_core::Track;
use rand::distributions::Open01;
use rand::{thread_rng, Rng};
use serde::Serialize;
use std::cmp::Ordering;

/// A track with the weight it was ordered by
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTrack {
    #[serde(flatten)]
    pub track: Track,
    pub weight: f64,
}

/// Weighted random permutation using the thread-local generator
///
/// Tracks whose weight is 0 are left out. Each call reshuffles.
pub fn order(tracks: Vec<Track>, config: &WeightConfig) -> Vec<Track> {
    order_with_rng(tracks, config, &mut thread_rng())
}

/// [`order`] with an explicit random source
pub fn order_with_rng<R: Rng + ?Sized>(
    tracks: Vec<Track>,
    config: &WeightConfig,
    rng: &mut R,
) -> Vec<Track> {
    rank(tracks, config, rng)
        .into_iter()
        .map(|ranked| ranked.track)
        .collect()
}

/// Weighted random permutation that keeps each track's weight
pub fn rank<R: Rng + ?Sized>(
    tracks: Vec<Track>,
    config: &WeightConfig,
    rng: &mut R,
) -> Vec<RankedTrack> {
    let weighted: Vec<RankedTrack> = tracks
        .into_iter()
        .map(|track| {
            let weight = weight(&track, config);
            RankedTrack { track, weight }
        })
        // Also drops NaN
        .filter(|ranked| ranked.weight > 0.0)
        .collect();

    let total: f64 = weighted.iter().map(|ranked| ranked.weight).sum();

    let mut keyed: Vec<(f64, RankedTrack)> = weighted
        .into_iter()
        .map(|ranked| {
            let u: f64 = rng.sample(Open01);
            (u.ln() * (total / ranked.weight), ranked)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| descending(*a, *b));
    keyed.into_iter().map(|(_, ranked)| ranked).collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
