//! Drives a conversion from the terminal: resolves the request, renders
//! events and turns Ctrl-C into cancellation.

use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{debug, warn};

use leonardo_core::{
    ConversionEvent, ConversionOutcome, ConversionRequest, Converter, ConverterError,
    PresetCatalog,
};

/// Shown when the transcoder cannot be used.
pub const INSTALL_HINT: &str = "\
Leonardo requires FFmpeg to convert media files.

Install FFmpeg using your package manager:
  Arch / Garuda:   sudo pacman -S ffmpeg
  Ubuntu / Debian: sudo apt install ffmpeg
  Fedora:          sudo dnf install ffmpeg

or point converter.ffmpeg_path (LEONARDO_CONVERTER__FFMPEG_PATH) at an existing binary.";

/// Builds the conversion request for the `convert` command.
///
/// Without a preset name the catalog's default is used; without an output
/// path the output sits next to the input with the preset's extension.
pub fn resolve_request(
    catalog: &PresetCatalog,
    input: &Path,
    output: Option<PathBuf>,
    preset_name: Option<&str>,
) -> Result<ConversionRequest> {
    let preset = match preset_name {
        Some(name) => catalog.find_by_name(name).ok_or_else(|| {
            let known: Vec<&str> = catalog.list().iter().map(|p| p.name.as_str()).collect();
            anyhow!("Unknown preset {:?}. Available: {}", name, known.join(", "))
        })?,
        None => catalog
            .default_preset()
            .context("Preset catalog is empty")?,
    };

    Ok(match output {
        Some(output) => ConversionRequest::new(input, output, preset.clone()),
        None => ConversionRequest::beside_input(input, preset.clone()),
    })
}

/// Fails with the install hint if the converter cannot be used.
pub async fn ensure_available<C: Converter>(converter: &C) -> Result<String> {
    match converter.validate().await {
        Ok(version) => {
            debug!("Using {}", version);
            Ok(version)
        }
        Err(e) if e.is_unavailable() => {
            bail!("{}\n\n{}", e.user_message(), INSTALL_HINT)
        }
        Err(e) => Err(e).context("Availability check failed"),
    }
}

/// Runs a conversion to its end, rendering events to `out`.
///
/// Ctrl-C requests cancellation; the job still reports its terminal event.
pub async fn run_conversion<C, W>(
    converter: &C,
    request: ConversionRequest,
    out: &mut W,
) -> Result<ConversionOutcome>
where
    C: Converter,
    W: Write,
{
    ensure_available(converter).await?;

    let output_path = request.output_path.clone();
    let preset = request
        .preset
        .as_ref()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "automatic".to_string());
    writeln!(
        out,
        "Converting {} -> {} ({})",
        request.input_path.display(),
        output_path.display(),
        preset
    )?;

    let mut handle = converter.start(request).await;

    let canceller = handle.canceller();
    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling conversion");
            canceller.cancel();
        }
    });

    while let Some(event) = handle.next_event().await {
        render_event(&event, &output_path, out)?;
    }
    interrupt.abort();

    Ok(handle.wait().await)
}

fn render_event<W: Write>(event: &ConversionEvent, output: &Path, out: &mut W) -> Result<()> {
    match event {
        ConversionEvent::Progress(p) => {
            write!(out, "\r{:>3}%", p.percent)?;
            if let Some(speed) = &p.speed {
                write!(out, " ({})", speed)?;
            }
            out.flush()?;
        }
        ConversionEvent::Done => writeln!(out)?,
        ConversionEvent::Completed => writeln!(out, "Completed: {}", output.display())?,
        ConversionEvent::Failed { message } => writeln!(out, "Failed: {}", message)?,
        ConversionEvent::Cancelled => writeln!(out, "Cancelled")?,
    }
    Ok(())
}

/// Maps a failed availability check for the `check` command.
pub fn describe_unavailable(err: &ConverterError) -> String {
    if err.is_unavailable() {
        format!("{}\n\n{}", err.user_message(), INSTALL_HINT)
    } else {
        err.user_message()
    }
}
