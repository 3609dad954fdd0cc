//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// How long `ffmpeg -version` may take before the tool counts as unavailable.
    #[serde(default = "default_availability_timeout")]
    pub availability_timeout_ms: u64,

    /// Pass `-y` so an existing output file is overwritten without prompting.
    #[serde(default = "default_overwrite")]
    pub overwrite_output: bool,

    /// Capacity of the per-job event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Additional global ffmpeg arguments, placed before `-i`.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_availability_timeout() -> u64 {
    2000
}

fn default_overwrite() -> bool {
    true
}

fn default_event_buffer() -> usize {
    64
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            availability_timeout_ms: default_availability_timeout(),
            overwrite_output: default_overwrite(),
            event_buffer: default_event_buffer(),
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ..Default::default()
        }
    }

    /// Sets the availability check timeout in milliseconds.
    pub fn with_availability_timeout(mut self, timeout_ms: u64) -> Self {
        self.availability_timeout_ms = timeout_ms;
        self
    }

    /// Enables or disables `-y`.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite_output = overwrite;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }
}
