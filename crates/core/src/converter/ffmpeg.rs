//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::path::Path;

use super::availability::check_availability;
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::job::{ConversionHandle, ConversionJob};
use super::probe::DurationProbe;
use super::traits::Converter;
use super::types::ConversionRequest;

/// FFmpeg-based converter implementation.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// The converter's configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn validate(&self) -> Result<String, ConverterError> {
        check_availability(&self.config).await
    }

    async fn probe_duration(&self, path: &Path) -> f64 {
        DurationProbe::new(self.config.ffmpeg_path.clone())
            .probe(path)
            .await
    }

    async fn start(&self, request: ConversionRequest) -> ConversionHandle {
        ConversionJob::spawn(&self.config, request)
    }
}
