//! Parsing of ffmpeg's streaming status lines.
//!
//! A status line looks like
//! `frame=  240 fps= 48 q=28.0 size=  1024kB time=00:00:09.60 bitrate= 873.8kbits/s speed=1.92x`.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::probe::parse_duration;

/// Marker preceding the elapsed-time field.
pub const TIME_MARKER: &str = "time=";

/// Width of the `HH:MM:SS.ff` token following [`TIME_MARKER`].
const TIMESTAMP_WIDTH: usize = 11;

static SPEED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"speed=\s*(\d+(?:\.\d+)?)x").unwrap());

/// Extracts the elapsed time of a status line, in seconds.
///
/// Returns `0.0` if the marker is missing, the token is truncated or it is
/// not a timestamp (ffmpeg prints `time=N/A` before the first frame).
pub fn extract_elapsed_seconds(line: &str) -> f64 {
    let Some(index) = line.find(TIME_MARKER) else {
        return 0.0;
    };
    let start = index + TIME_MARKER.len();
    line.get(start..start + TIMESTAMP_WIDTH)
        .and_then(parse_duration)
        .unwrap_or(0.0)
}

/// Converts elapsed seconds into a whole percentage of `duration_secs`,
/// floored and clamped to `0..=100`.
pub fn percent_complete(elapsed_secs: f64, duration_secs: f64) -> u8 {
    let ratio = 100.0 * elapsed_secs / duration_secs;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    ratio.min(100.0).floor() as u8
}

/// Extracts the processing speed (e.g. `"1.92x"`) of a status line.
pub fn extract_speed(line: &str) -> Option<String> {
    SPEED_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}x", m.as_str()))
}
