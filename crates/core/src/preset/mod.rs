//! Fixed conversion presets.

mod catalog;
mod types;

pub use catalog::{
    PresetCatalog, DAVINCI_PRESET, REMUX_PRESET, VERTICAL_PRESET, YOUTUBE_PRESET,
};
pub(crate) use catalog::DAVINCI_ARGS;
pub use types::Preset;
