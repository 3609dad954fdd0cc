//! Converter module: runs ffmpeg with a preset and reports progress.
//!
//! This module provides the `Converter` trait and the FFmpeg implementation
//! behind it, plus the pieces it is made of:
//!
//! - `DurationProbe`: reads the source duration from ffmpeg's input header
//! - `extract_elapsed_seconds`: reads `time=HH:MM:SS.ff` from status lines
//! - `ConversionJob`: spawns ffmpeg, streams progress, handles cancellation
//! - `check_availability`: the `ffmpeg -version` gate
//!
//! # Example
//!
//! ```ignore
//! use leonardo_core::converter::{Converter, ConversionEvent, ConversionRequest, FfmpegConverter};
//! use leonardo_core::preset::PresetCatalog;
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let catalog = PresetCatalog::builtin();
//! let preset = catalog.default_preset().unwrap().clone();
//! let mut handle = converter
//!     .start(ConversionRequest::beside_input("/videos/clip.mp4", preset))
//!     .await;
//!
//! while let Some(event) = handle.next_event().await {
//!     match event {
//!         ConversionEvent::Progress(p) => println!("{}%", p.percent),
//!         ConversionEvent::Completed => println!("done"),
//!         ConversionEvent::Failed { message } => eprintln!("{}", message),
//!         _ => {}
//!     }
//! }
//! ```

mod availability;
mod config;
mod error;
mod ffmpeg;
mod job;
mod probe;
mod progress;
mod traits;
mod types;

pub use availability::check_availability;
pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use job::{build_args, Canceller, ConversionHandle, ConversionJob};
pub use probe::{
    duration_from_output, parse_duration, DurationProbe, DURATION_MARKER, FALLBACK_DURATION_SECS,
};
pub use progress::{extract_elapsed_seconds, extract_speed, percent_complete, TIME_MARKER};
pub use traits::Converter;
pub use types::{
    ConversionEvent, ConversionOutcome, ConversionProgress, ConversionRequest, JobState,
};
