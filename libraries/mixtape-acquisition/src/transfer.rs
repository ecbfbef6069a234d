use bytes::BytesMut;
use futures_util::StreamExt;
use mixtape_core::objects::{audio_key, AUDIO_CONTENT_TYPE};
use mixtape_core::{MediaResolver, MixtapeError, ObjectStore, Result, Track};

/// Fetch a track's audio into memory and write it to the object store
///
/// Returns the object key. The key depends only on the track id, so a
/// retry overwrites whatever an earlier attempt left behind.
pub(crate) async fn fetch_and_store(
    resolver: &dyn MediaResolver,
    store: &dyn ObjectStore,
    bucket: &str,
    track: &Track,
) -> Result<String> {
    let mut stream = resolver.stream_audio(&track.source_url).await?;

    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }

    if buffer.is_empty() {
        return Err(MixtapeError::fetch(format!(
            "empty audio stream for {}",
            track.source_url
        )));
    }

    let key = audio_key(&track.id);
    tracing::debug!(track_id = %track.id, bytes = buffer.len(), key = %key, "Uploading audio");
    store
        .put(bucket, &key, buffer.freeze(), AUDIO_CONTENT_TYPE)
        .await?;

    Ok(key)
}
