//! Mixtape Acquisition
//!
//! Turns submitted URLs into stored audio.
//!
//! - [`Ingestion`] resolves a URL into track descriptors and writes new
//!   rows in `awaiting download`, skipping sources the owner already has.
//! - [`AcquisitionScheduler`] polls for those rows and downloads them in
//!   the background under a concurrency cap, an admission spacing and a
//!   per-track deadline, recording `downloaded` or `error`.
//!
//! The two halves never talk directly: the repository is the hand-off,
//! so either side can restart independently.

#![forbid(unsafe_code)]

mod admission;
mod config;
mod in_flight;
mod ingestion;
mod scheduler;
mod transfer;

pub use admission::Admission;
pub use config::AcquisitionConfig;
pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use ingestion::Ingestion;
pub use scheduler::{AcquisitionScheduler, Outcome};
