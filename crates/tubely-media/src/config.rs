//! Media tool configuration.

use std::time::Duration;

/// Default bound on a single probe or remux invocation.
pub const DEFAULT_SUBPROCESS_TIMEOUT_SECS: u64 = 600;

/// Locations of the media tools and the subprocess time bound.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Probe program (ffprobe)
    pub ffprobe_path: String,
    /// Remux program (ffmpeg)
    pub ffmpeg_path: String,
    /// Per-invocation timeout; `None` disables the bound.
    ///
    /// Probe and remux are each bounded separately, so one upload can spend
    /// up to twice this in subprocesses.
    pub subprocess_timeout: Option<Duration>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            subprocess_timeout: Some(Duration::from_secs(DEFAULT_SUBPROCESS_TIMEOUT_SECS)),
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    ///
    /// `SUBPROCESS_TIMEOUT_SECS=0` disables the timeout.
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("SUBPROCESS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SUBPROCESS_TIMEOUT_SECS);

        Self {
            ffprobe_path: std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            subprocess_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }
}
