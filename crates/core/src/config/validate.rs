use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - ffmpeg path is not empty
/// - availability timeout is not 0
/// - event buffer is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let converter = &config.converter;

    if converter.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if converter.availability_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "converter.availability_timeout_ms cannot be 0".to_string(),
        ));
    }

    // tokio's mpsc panics on a zero capacity
    if converter.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "converter.event_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
