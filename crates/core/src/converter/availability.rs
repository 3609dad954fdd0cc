//! Transcoder availability check.

use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use crate::metrics;

/// Runs `ffmpeg -version` and returns the first line of its banner.
///
/// The tool counts as unavailable if it cannot be started, exits with a
/// non-zero status, or does not finish within
/// [`ConverterConfig::availability_timeout_ms`]. A process that overruns the
/// timeout is killed.
pub async fn check_availability(config: &ConverterConfig) -> Result<String, ConverterError> {
    let result = run_version_check(config).await;
    let label = match &result {
        Ok(_) => "available",
        Err(ConverterError::AvailabilityTimeout { .. }) => "timeout",
        Err(_) => "unavailable",
    };
    metrics::AVAILABILITY_CHECKS.with_label_values(&[label]).inc();
    result
}

async fn run_version_check(config: &ConverterConfig) -> Result<String, ConverterError> {
    let child = Command::new(&config.ffmpeg_path)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ConverterError::from_spawn(e, &config.ffmpeg_path))?;

    let limit = Duration::from_millis(config.availability_timeout_ms);
    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            // Dropping the future drops the child, which kills it.
            warn!(
                "{:?} -version did not finish within {} ms",
                config.ffmpeg_path, config.availability_timeout_ms
            );
            return Err(ConverterError::AvailabilityTimeout {
                timeout_ms: config.availability_timeout_ms,
            });
        }
    };

    if !output.status.success() {
        return Err(ConverterError::unavailable(format!(
            "{} -version exited with {}",
            config.ffmpeg_path.display(),
            output.status
        )));
    }

    let banner = String::from_utf8_lossy(&output.stdout);
    let first_line = banner.lines().next().unwrap_or_default().trim().to_string();
    debug!("Found {}", first_line);
    Ok(first_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let config = ConverterConfig::with_ffmpeg_path("/nonexistent/ffmpeg-binary");
        let err = check_availability(&config).await.unwrap_err();
        assert!(matches!(err, ConverterError::FfmpegNotFound { .. }));
        assert!(err.is_unavailable());
    }
}
