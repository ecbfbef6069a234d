//! Object naming conventions for downloaded audio
//!
//! Keys are derived only from the track id and the fixed output format,
//! so every retry of the same track overwrites the same object.

use crate::types::TrackId;

/// Extension of the single output format
pub const AUDIO_EXTENSION: &str = "mp3";

/// Content type of the single output format
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Object key for a track's audio (`{id}.mp3`)
pub fn audio_key(id: &TrackId) -> String {
    format!("{}.{}", id.as_str(), AUDIO_EXTENSION)
}

/// Public URL of an object on a virtual-hosted bucket
/// (`https://{bucket}.{domain}/{key}`)
pub fn virtual_hosted_url(bucket: &str, domain: &str, key: &str) -> String {
    format!("https://{bucket}.{domain}/{key}")
}
