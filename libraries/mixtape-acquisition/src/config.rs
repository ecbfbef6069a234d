use std::time::Duration;

/// Limits the scheduler runs under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Bucket the audio objects are written to
    pub bucket: String,
    /// Upper bound on transfers running at once
    pub max_concurrent_downloads: usize,
    /// Minimum gap between two admissions; zero disables spacing
    pub admission_spacing: Duration,
    /// Wall-clock budget of one track, measured from admission
    pub track_timeout: Duration,
    /// Delay between two repository polls
    pub poll_interval: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            bucket: "tracks".to_string(),
            max_concurrent_downloads: 30,
            admission_spacing: Duration::from_millis(200),
            track_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(800),
        }
    }
}
