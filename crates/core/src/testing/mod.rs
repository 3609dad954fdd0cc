//! Testing utilities: a mock converter and fake ffmpeg fixtures.
//!
//! `MockConverter` drives callers without spawning anything. The
//! `fixtures` module writes a shell script that behaves like ffmpeg
//! for probing, version checks and conversions, so the real
//! `FfmpegConverter` can be exercised end to end.
//!
//! # Example
//!
//! ```rust,ignore
//! use leonardo_core::testing::fixtures::FakeFfmpeg;
//!
//! let dir = tempfile::tempdir()?;
//! let ffmpeg = FakeFfmpeg::new()
//!     .with_duration("00:10:00.00")
//!     .with_progress(["00:02:00.00", "00:05:00.00"])
//!     .install(dir.path())?;
//!
//! let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(ffmpeg));
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, MockOutcome};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io;
    use std::path::{Path, PathBuf};

    /// File name of the installed script.
    pub const SCRIPT_NAME: &str = "ffmpeg";
    /// File the script writes its PID to in convert mode.
    pub const PID_FILE: &str = "ffmpeg.pid";
    /// File the script writes its arguments to in convert mode, one per line.
    pub const ARGS_FILE: &str = "ffmpeg.args";
    /// File the script writes its process group ID to in convert mode (Linux only).
    pub const PGID_FILE: &str = "ffmpeg.pgid";

    /// Builder for a shell script standing in for ffmpeg.
    ///
    /// - `-version` prints a banner (or exits 1 when unavailable)
    /// - `-i <input>` alone prints an input header, with a duration if set
    /// - anything else is a conversion: status lines separated by `\r`,
    ///   optional diagnostics, then the configured exit code
    #[derive(Debug, Clone)]
    pub struct FakeFfmpeg {
        available: bool,
        version_delay_secs: Option<f64>,
        duration: Option<String>,
        hang_on_probe: bool,
        silent_probe: bool,
        progress: Vec<String>,
        step_delay_secs: f64,
        diagnostics: Vec<String>,
        hang_after_progress: bool,
        exit_code: i32,
        record_dir: Option<PathBuf>,
    }

    impl Default for FakeFfmpeg {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeFfmpeg {
        /// A fake that is available, has no duration and converts instantly.
        pub fn new() -> Self {
            Self {
                available: true,
                version_delay_secs: None,
                duration: None,
                hang_on_probe: false,
                silent_probe: false,
                progress: Vec::new(),
                step_delay_secs: 0.05,
                diagnostics: Vec::new(),
                hang_after_progress: false,
                exit_code: 0,
                record_dir: None,
            }
        }

        /// Make `-version` exit with status 1.
        pub fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }

        /// Delay the `-version` banner.
        pub fn with_version_delay(mut self, secs: f64) -> Self {
            self.version_delay_secs = Some(secs);
            self
        }

        /// Report `Duration: <timestamp>` when probed.
        pub fn with_duration(mut self, timestamp: impl Into<String>) -> Self {
            self.duration = Some(timestamp.into());
            self
        }

        /// Never return from a probe.
        pub fn hanging_probe(mut self) -> Self {
            self.hang_on_probe = true;
            self
        }

        /// Exit from a probe at once without printing anything.
        pub fn silent_probe(mut self) -> Self {
            self.silent_probe = true;
            self
        }

        /// Elapsed timestamps printed as `time=` status lines.
        pub fn with_progress<I, S>(mut self, timestamps: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.progress = timestamps.into_iter().map(Into::into).collect();
            self
        }

        /// Pause between status lines.
        pub fn with_step_delay(mut self, secs: f64) -> Self {
            self.step_delay_secs = secs;
            self
        }

        /// Lines printed to stderr after the status lines.
        pub fn with_diagnostics<I, S>(mut self, lines: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.diagnostics = lines.into_iter().map(Into::into).collect();
            self
        }

        /// Keep running after the last status line until killed.
        pub fn hanging_after_progress(mut self) -> Self {
            self.hang_after_progress = true;
            self
        }

        /// Exit status of a conversion.
        pub fn with_exit_code(mut self, code: i32) -> Self {
            self.exit_code = code;
            self
        }

        /// Record the PID and arguments of conversions into `dir`.
        pub fn recording_into(mut self, dir: impl Into<PathBuf>) -> Self {
            self.record_dir = Some(dir.into());
            self
        }

        /// Renders the script text.
        pub fn script(&self) -> String {
            let mut s = String::from("#!/bin/sh\n");

            s.push_str("if [ \"$1\" = \"-version\" ]; then\n");
            if let Some(delay) = self.version_delay_secs {
                s.push_str(&format!("  sleep {}\n", delay));
            }
            if self.available {
                s.push_str("  echo 'ffmpeg version 6.1-fake Copyright (c) 2000-2023 the FFmpeg developers'\n");
                s.push_str("  echo 'built with fake-cc'\n");
                s.push_str("  exit 0\n");
            } else {
                s.push_str("  echo 'ffmpeg: broken installation' >&2\n");
                s.push_str("  exit 1\n");
            }
            s.push_str("fi\n");

            s.push_str("if [ \"$#\" -eq 2 ] && [ \"$1\" = \"-i\" ]; then\n");
            if self.silent_probe {
                s.push_str("  exit 1\n");
            }
            s.push_str("  echo \"Input #0, mov,mp4,m4a,3gp,3g2,mj2, from '$2':\" >&2\n");
            if let Some(duration) = &self.duration {
                s.push_str(&format!(
                    "  echo {} >&2\n",
                    quote(&format!(
                        "  Duration: {}, start: 0.000000, bitrate: 2500 kb/s",
                        duration
                    ))
                ));
            }
            if self.hang_on_probe {
                s.push_str("  exec sleep 30\n");
            }
            s.push_str("  echo 'At least one output file must be specified' >&2\n");
            s.push_str("  exit 1\n");
            s.push_str("fi\n");

            if let Some(dir) = &self.record_dir {
                let dir = dir.to_string_lossy();
                s.push_str(&format!("echo $$ > {}\n", quote(&format!("{}/{}", dir, PID_FILE))));
                s.push_str(&format!(
                    "printf '%s\\n' \"$@\" > {}\n",
                    quote(&format!("{}/{}", dir, ARGS_FILE))
                ));
                s.push_str(&format!(
                    "[ -r /proc/$$/stat ] && cut -d' ' -f5 /proc/$$/stat > {}\n",
                    quote(&format!("{}/{}", dir, PGID_FILE))
                ));
            }
            for (frame, timestamp) in self.progress.iter().enumerate() {
                s.push_str(&format!(
                    "printf 'frame=%5d fps= 25 q=28.0 size=  256kB time=%s bitrate= 800.0kbits/s speed=2.5x\\r' {} {} >&2\n",
                    (frame + 1) * 25,
                    quote(timestamp)
                ));
                s.push_str(&format!("sleep {}\n", self.step_delay_secs));
            }
            for line in &self.diagnostics {
                s.push_str(&format!("echo {} >&2\n", quote(line)));
            }
            if self.hang_after_progress {
                s.push_str("exec sleep 30\n");
            }
            s.push_str(&format!("exit {}\n", self.exit_code));
            s
        }

        /// Writes the executable script into `dir` and returns its path.
        #[cfg(unix)]
        pub fn install(&self, dir: &Path) -> io::Result<PathBuf> {
            use std::os::unix::fs::PermissionsExt;

            let path = dir.join(SCRIPT_NAME);
            std::fs::write(&path, self.script())?;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
            Ok(path)
        }
    }

    /// Single-quotes a string for `sh`.
    fn quote(value: &str) -> String {
        format!("'{}'", value.replace('\'', "'\\''"))
    }

}
