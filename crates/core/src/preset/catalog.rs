//! The built-in preset registry.

use std::path::{Path, PathBuf};

use super::types::Preset;

/// Name of the editor-friendly intermediate preset (the default).
pub const DAVINCI_PRESET: &str = "DaVinci Resolve (Linux Free Compatible)";
/// Name of the stream-copy remux preset.
pub const REMUX_PRESET: &str = "OBS Remux (Fast, No Re-Encode)";
/// Name of the web-delivery re-encode preset.
pub const YOUTUBE_PRESET: &str = "YouTube H.264";
/// Name of the vertical crop preset.
pub const VERTICAL_PRESET: &str = "TikTok Vertical 9:16 (Auto Crop)";

/// Still-image video codec plus uncompressed audio, wrapped in `mov`.
///
/// Also used as the fallback for `.mp4` inputs when no preset is given.
#[rustfmt::skip]
pub(crate) const DAVINCI_ARGS: &[&str] = &[
    "-vcodec", "mjpeg",
    "-q:v", "2",
    "-acodec", "pcm_s16be",
    "-q:a", "0",
    "-f", "mov",
];

/// Immutable, ordered registry of conversion presets.
///
/// The first preset is the default.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PresetCatalog {
    /// Creates a catalog from an explicit preset list.
    ///
    /// Later presets whose names collide with earlier ones are dropped.
    pub fn new(presets: Vec<Preset>) -> Self {
        let mut unique: Vec<Preset> = Vec::with_capacity(presets.len());
        for preset in presets {
            if unique.iter().any(|p| p.name == preset.name) {
                tracing::warn!("Ignoring duplicate preset name: {}", preset.name);
                continue;
            }
            unique.push(preset);
        }
        Self { presets: unique }
    }

    /// The four built-in presets.
    #[rustfmt::skip]
    pub fn builtin() -> Self {
        Self::new(vec![
            Preset::new(DAVINCI_PRESET, ".mov", DAVINCI_ARGS.iter().copied()),
            Preset::new(REMUX_PRESET, ".mp4", ["-c", "copy"]),
            Preset::new(
                YOUTUBE_PRESET,
                ".mp4",
                [
                    "-c:v", "libx264",
                    "-preset", "slow",
                    "-crf", "18",
                    "-c:a", "aac",
                    "-b:a", "192k",
                ],
            ),
            Preset::new(
                VERTICAL_PRESET,
                ".mp4",
                [
                    "-vf", "crop=in_h*9/16:in_h,scale=1080:1920",
                    "-c:v", "libx264",
                    "-preset", "medium",
                    "-crf", "20",
                    "-pix_fmt", "yuv420p",
                    "-profile:v", "high",
                    "-level", "4.1",
                    "-c:a", "aac",
                    "-b:a", "160k",
                    "-movflags", "+faststart",
                ],
            ),
        ])
    }

    /// All presets, in display order.
    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    /// Looks up a preset by its exact display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// The default preset (first in the list).
    pub fn default_preset(&self) -> Option<&Preset> {
        self.presets.first()
    }

    /// Number of presets.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Derives an output path for `input` by swapping its extension for the
    /// preset's.
    pub fn output_path_for(input: &Path, preset: &Preset) -> PathBuf {
        input.with_extension(preset.extension())
    }
}
