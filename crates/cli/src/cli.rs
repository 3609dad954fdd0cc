use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leonardo")]
#[command(author, version, about = "Preset-based video conversion on top of ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print Prometheus metrics to stdout after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a file using a preset
    Convert {
        /// Input file to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Output file (defaults to the input path with the preset's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Preset name (defaults to the first built-in preset)
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// List the built-in presets
    Presets,

    /// Check that ffmpeg is available
    Check,

    /// Probe a media file's duration
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,
    },
}
