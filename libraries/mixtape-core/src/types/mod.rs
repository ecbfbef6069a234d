//! Domain types shared by every mixtape crate

mod ids;
mod status;
mod track;

pub use ids::{TrackId, UserId};
pub use status::DownloadStatus;
pub use track::{ResolvedTrack, Track, TrackDescriptor};
