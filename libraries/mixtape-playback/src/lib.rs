//! Mixtape Playback
//!
//! Decides the order a user's downloaded tracks are played in.
//!
//! Every track gets a weight from its length and popularity
//! ([`weight`]); [`order`] then draws a weighted random permutation, so
//! heavier tracks tend to come first without the order ever being fixed.
//!
//! The ordering is pure: no I/O, and the random source can be passed in
//! ([`order_with_rng`], [`rank`]) for reproducible results.

#![forbid(unsafe_code)]

mod shuffle;
mod weighting;

pub use shuffle::{order, order_with_rng, rank, RankedTrack};
pub use weighting::{weight, WeightConfig};
