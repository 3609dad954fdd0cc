//! Types for the preset module.

use serde::{Deserialize, Serialize};

/// A named conversion profile.
///
/// The arguments are inserted between the fixed input and output arguments
/// of the transcoder command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Display name, unique within a catalog.
    pub name: String,
    /// Output file extension, including the leading dot (e.g. ".mov").
    pub output_extension: String,
    /// Transcoder arguments, in order.
    pub args: Vec<String>,
}

impl Preset {
    /// Creates a new preset.
    pub fn new<I, S>(name: impl Into<String>, output_extension: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            output_extension: output_extension.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the extension without its leading dot.
    pub fn extension(&self) -> &str {
        self.output_extension.trim_start_matches('.')
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_new() {
        let preset = Preset::new("Copy", ".mkv", ["-c", "copy"]);
        assert_eq!(preset.name, "Copy");
        assert_eq!(preset.output_extension, ".mkv");
        assert_eq!(preset.args, vec!["-c".to_string(), "copy".to_string()]);
    }

    #[test]
    fn test_extension_strips_dot() {
        let preset = Preset::new("Copy", ".mkv", ["-c", "copy"]);
        assert_eq!(preset.extension(), "mkv");

        let bare = Preset::new("Bare", "mp4", Vec::<String>::new());
        assert_eq!(bare.extension(), "mp4");
    }

    #[test]
    fn test_display_is_name() {
        let preset = Preset::new("YouTube H.264", ".mp4", ["-c:v", "libx264"]);
        assert_eq!(preset.to_string(), "YouTube H.264");
    }
}
