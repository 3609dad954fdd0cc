//! Source duration probing.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::metrics;

/// Duration used when the source duration cannot be determined.
///
/// Percentages computed against it are meaningless but never panic.
pub const FALLBACK_DURATION_SECS: f64 = 1.0;

/// Marker preceding the duration in ffmpeg's input header.
pub const DURATION_MARKER: &str = "Duration:";

/// Parses an `HH:MM:SS[.fraction]` timestamp into seconds.
pub fn parse_duration(token: &str) -> Option<f64> {
    let mut parts = token.trim().split(':');
    let hours: f64 = parts.next()?.trim().parse().ok()?;
    let minutes: f64 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    total.is_finite().then_some(total)
}

/// Finds the first `Duration: HH:MM:SS.xx,` header in ffmpeg output.
///
/// Only the first header counts; `Duration: N/A` yields `None`.
pub fn duration_from_output(output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        line.split_once(DURATION_MARKER).map(|(_, rest)| {
            let token = rest.split(',').next().unwrap_or_default();
            parse_duration(token)
        })
    })?
}

/// Reads the source duration by running ffmpeg against the input alone.
#[derive(Debug, Clone)]
pub struct DurationProbe {
    ffmpeg_path: PathBuf,
}

impl DurationProbe {
    /// Creates a probe using the given ffmpeg binary.
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Returns the duration of `input` in seconds, or
    /// [`FALLBACK_DURATION_SECS`] if it cannot be determined.
    pub async fn probe(&self, input: &Path) -> f64 {
        match self.try_probe(input).await {
            Some(secs) => {
                debug!("Probed duration of {:?}: {:.2}s", input, secs);
                secs
            }
            None => {
                metrics::PROBE_FALLBACKS.inc();
                FALLBACK_DURATION_SECS
            }
        }
    }

    async fn try_probe(&self, input: &Path) -> Option<f64> {
        // Without an output file ffmpeg prints the input header and exits
        // with an error status; only the text matters here.
        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| warn!("Failed to run {:?} for probing: {}", self.ffmpeg_path, e))
            .ok()?;

        let mut combined = String::from_utf8_lossy(&output.stderr).into_owned();
        combined.push('\n');
        combined.push_str(&String::from_utf8_lossy(&output.stdout));

        let duration = duration_from_output(&combined);
        if duration.is_none() {
            warn!(
                "No duration found for {:?}, falling back to {}s",
                input, FALLBACK_DURATION_SECS
            );
        }
        duration
    }
}
