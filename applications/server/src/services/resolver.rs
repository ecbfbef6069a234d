/// Media resolver backed by the yt-dlp executable
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use mixtape_core::{AudioStream, MediaResolver, MixtapeError, ResolvedTrack, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::io::ReaderStream;

#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: PathBuf,
}

/// Fields of a yt-dlp info dict the library cares about
#[derive(Debug, Deserialize)]
struct InfoDict {
    track: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    original_url: Option<String>,
    webpage_url: Option<String>,
    extractor: Option<String>,
    album: Option<String>,
    thumbnail: Option<String>,
}

impl From<InfoDict> for ResolvedTrack {
    fn from(info: InfoDict) -> Self {
        ResolvedTrack {
            title: info.track.filter(|t| !t.is_empty()).or(info.title),
            duration: info.duration,
            source_url: info.original_url.or(info.webpage_url),
            extractor: info.extractor,
            thumbnail: info.thumbnail,
            album: info.album,
        }
    }
}

impl YtDlpResolver {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, url: &str) -> Result<Vec<ResolvedTrack>> {
        tracing::debug!(url, "Resolving with yt-dlp");

        let output = self
            .command()
            .arg("--dump-json")
            .arg("--no-warnings")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                MixtapeError::resolution(format!(
                    "failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MixtapeError::resolution(format!(
                "yt-dlp could not resolve {url} ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_info_lines(&output.stdout)
    }

    async fn stream_audio(&self, source_url: &str) -> Result<AudioStream> {
        let mut child = self
            .command()
            .arg(source_url)
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--no-warnings")
            .arg("--quiet")
            .arg("-o")
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                MixtapeError::fetch(format!("failed to run {}: {e}", self.binary.display()))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MixtapeError::fetch("yt-dlp stdout was not captured"))?;

        let body = ReaderStream::new(stdout)
            .map(|chunk| chunk.map_err(|e| MixtapeError::fetch(format!("reading yt-dlp output: {e}"))));

        // Runs once stdout hits EOF. The child moves in here, so dropping
        // the stream early drops it and kill_on_drop ends the process.
        let exit = stream::once(async move {
            match child.wait().await {
                Ok(status) if status.success() => None::<Result<Bytes>>,
                Ok(status) => Some(Err(MixtapeError::fetch(format!("yt-dlp exited with {status}")))),
                Err(e) => Some(Err(MixtapeError::fetch(format!("waiting for yt-dlp: {e}")))),
            }
        })
        .filter_map(futures_util::future::ready);

        Ok(body.chain(exit).boxed())
    }
}

/// One JSON info dict per non-empty line
fn parse_info_lines(stdout: &[u8]) -> Result<Vec<ResolvedTrack>> {
    let text = std::str::from_utf8(stdout)
        .map_err(|e| MixtapeError::resolution(format!("yt-dlp output is not UTF-8: {e}")))?;

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<InfoDict>(line)
                .map(ResolvedTrack::from)
                .map_err(|e| MixtapeError::resolution(format!("unparsable yt-dlp output: {e}")))
        })
        .collect()
}
