//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::job::ConversionHandle;
use super::types::ConversionRequest;

/// A converter that runs preset conversions in the background.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Checks that the converter can be used, returning a version string.
    async fn validate(&self) -> Result<String, ConverterError>;

    /// Returns the duration of a media file in seconds, or the fallback
    /// duration if it cannot be determined.
    async fn probe_duration(&self, path: &Path) -> f64;

    /// Starts a conversion in the background.
    ///
    /// The returned handle yields progress events, `Done`, then exactly one
    /// terminal event.
    async fn start(&self, request: ConversionRequest) -> ConversionHandle;
}
