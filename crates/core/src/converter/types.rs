//! Types for the converter module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::preset::{Preset, PresetCatalog};

/// A conversion request from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Input file path.
    pub input_path: PathBuf,
    /// Output file path.
    pub output_path: PathBuf,
    /// Selected preset. `None` falls back to an input-based choice.
    pub preset: Option<Preset>,
}

impl ConversionRequest {
    /// Creates a request using the given preset.
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, preset: Preset) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            preset: Some(preset),
        }
    }

    /// Creates a request without a preset.
    pub fn without_preset(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            preset: None,
        }
    }

    /// Creates a request whose output sits next to the input with the
    /// preset's extension.
    pub fn beside_input(input_path: impl Into<PathBuf>, preset: Preset) -> Self {
        let input_path = input_path.into();
        let output_path = PresetCatalog::output_path_for(&input_path, &preset);
        Self {
            input_path,
            output_path,
            preset: Some(preset),
        }
    }
}

/// Lifecycle state of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Whether the state is terminal (absorbing).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Short lowercase name, also used as metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress update during conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Job ID.
    pub job_id: Uuid,
    /// Progress percentage (0 - 100).
    pub percent: u8,
    /// Elapsed media time reported by the transcoder, in seconds.
    pub elapsed_secs: f64,
    /// Probed source duration in seconds.
    pub duration_secs: f64,
    /// Current processing speed (e.g., "1.5x").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
}

/// Events delivered to the caller of a conversion, in emission order.
///
/// A job emits any number of `Progress` events, then `Done` exactly once,
/// then exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionEvent {
    /// Percent-complete update.
    Progress(ConversionProgress),
    /// The job left the running state; callers may re-enable their controls.
    Done,
    /// The transcode finished successfully.
    Completed,
    /// The transcode failed.
    Failed { message: String },
    /// The transcode was cancelled.
    Cancelled,
}

impl ConversionEvent {
    /// Whether this is one of the terminal events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. } | Self::Cancelled)
    }
}

/// Final report of a conversion job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Job ID.
    pub job_id: Uuid,
    /// Terminal state.
    pub state: JobState,
    /// Last progress value (100 on completion, 0 on cancellation).
    pub final_percent: u8,
    /// Probed source duration in seconds.
    pub duration_secs: f64,
    /// Failure message, for failed jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the job started running.
    pub started_at: DateTime<Utc>,
    /// When the job reached its terminal state.
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}

impl ConversionOutcome {
    /// Whether the job completed successfully.
    pub fn is_success(&self) -> bool {
        self.state == JobState::Completed
    }
}
