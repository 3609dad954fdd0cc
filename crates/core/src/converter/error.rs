//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while checking for, or running, the transcoder.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFmpeg was found but did not answer the version check.
    #[error("FFmpeg unavailable: {reason}")]
    ToolUnavailable { reason: String },

    /// The version check did not finish in time.
    #[error("FFmpeg did not respond within {timeout_ms} ms")]
    AvailabilityTimeout { timeout_ms: u64 },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error while talking to the child process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job was cancelled.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConverterError {
    /// Creates a new conversion failed error with diagnostic output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new tool unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::ToolUnavailable {
            reason: reason.into(),
        }
    }

    /// Maps a spawn error, turning `NotFound` into [`ConverterError::FfmpegNotFound`].
    pub fn from_spawn(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FfmpegNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }

    /// Whether this error means the transcoder cannot be used at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::FfmpegNotFound { .. } | Self::ToolUnavailable { .. } | Self::AvailabilityTimeout { .. }
        )
    }

    /// Message shown to the user, including captured diagnostics if any.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConversionFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => format!("{}\n{}", self, stderr.trim_end()),
            _ => self.to_string(),
        }
    }
}
