pub mod config;
pub mod converter;
pub mod metrics;
pub mod preset;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LoggingConfig,
};
pub use converter::{
    Canceller, ConversionEvent, ConversionHandle, ConversionOutcome, ConversionProgress,
    ConversionRequest, Converter, ConverterConfig, ConverterError, FfmpegConverter, JobState,
};
pub use preset::{Preset, PresetCatalog};
