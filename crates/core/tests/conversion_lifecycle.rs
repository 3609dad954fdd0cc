//! Conversion lifecycle integration tests.
//!
//! These tests drive the real `FfmpegConverter` against a fake ffmpeg
//! shell script:
//! - Progress reporting and natural completion
//! - Failure on non-zero exit and on spawn errors
//! - Cancellation while converting and while probing
//! - Duration probing and availability checks

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use leonardo_core::{
    converter::{
        check_availability, ConversionEvent, ConversionHandle, ConversionRequest, Converter,
        ConverterConfig, ConverterError, FfmpegConverter, JobState, FALLBACK_DURATION_SECS,
    },
    preset::{PresetCatalog, REMUX_PRESET},
    testing::fixtures::{FakeFfmpeg, ARGS_FILE, PGID_FILE, PID_FILE},
};

/// Test helper holding the fake binary and its scratch directory.
struct TestHarness {
    converter: FfmpegConverter,
    dir: TempDir,
}

impl TestHarness {
    fn new(fake: FakeFfmpeg) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let ffmpeg = fake
            .recording_into(dir.path())
            .install(dir.path())
            .expect("Failed to install fake ffmpeg");
        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(ffmpeg));
        Self { converter, dir }
    }

    fn request(&self) -> ConversionRequest {
        let preset = PresetCatalog::builtin()
            .find_by_name(REMUX_PRESET)
            .expect("remux preset")
            .clone();
        ConversionRequest::beside_input(self.dir.path().join("clip.mkv"), preset)
    }

    fn recorded(&self, file: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(file)).ok()
    }
}

async fn collect(handle: &mut ConversionHandle) -> Vec<ConversionEvent> {
    let mut events = Vec::new();
    while let Some(event) = tokio::time::timeout(Duration::from_secs(10), handle.next_event())
        .await
        .expect("Timed out waiting for event")
    {
        events.push(event);
    }
    events
}

fn percents(events: &[ConversionEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            ConversionEvent::Progress(p) => Some(p.percent),
            _ => None,
        })
        .collect()
}

fn terminals(events: &[ConversionEvent]) -> Vec<&ConversionEvent> {
    events.iter().filter(|e| e.is_terminal()).collect()
}

fn process_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid.trim()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// =============================================================================
// Completion
// =============================================================================

#[tokio::test]
async fn test_conversion_reports_progress_and_completes() {
    let harness = TestHarness::new(
        FakeFfmpeg::new()
            .with_duration("00:10:00.00")
            .with_progress(["00:02:00.00", "00:05:00.00", "00:09:00.00"]),
    );

    let mut handle = harness.converter.start(harness.request()).await;
    let events = collect(&mut handle).await;

    assert_eq!(percents(&events), vec![20, 50, 90, 100]);
    assert_eq!(
        &events[events.len() - 2..],
        &[ConversionEvent::Done, ConversionEvent::Completed]
    );

    let outcome = handle.wait().await;
    assert!(outcome.is_success());
    assert_eq!(outcome.final_percent, 100);
    assert_eq!(outcome.duration_secs, 600.0);
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_progress_reports_speed() {
    let harness = TestHarness::new(
        FakeFfmpeg::new()
            .with_duration("00:01:00.00")
            .with_progress(["00:00:30.00"]),
    );

    let mut handle = harness.converter.start(harness.request()).await;
    let events = collect(&mut handle).await;

    match &events[0] {
        ConversionEvent::Progress(p) => {
            assert_eq!(p.percent, 50);
            assert_eq!(p.elapsed_secs, 30.0);
            assert_eq!(p.speed.as_deref(), Some("2.5x"));
            assert_eq!(p.job_id, handle.job_id());
        }
        other => panic!("Expected progress, got {:?}", other),
    }
}

#[tokio::test]
async fn test_probe_fallback_saturates_progress() {
    // No duration header: every timestamp is measured against one second
    let harness = TestHarness::new(
        FakeFfmpeg::new().with_progress(["00:00:00.50", "00:00:03.00", "00:00:07.00"]),
    );

    let mut handle = harness.converter.start(harness.request()).await;
    let events = collect(&mut handle).await;

    assert_eq!(percents(&events), vec![50, 100, 100, 100]);
    let outcome = handle.wait().await;
    assert!(outcome.is_success());
    assert_eq!(outcome.duration_secs, FALLBACK_DURATION_SECS);
}

#[tokio::test]
async fn test_arguments_passed_to_ffmpeg() {
    let harness = TestHarness::new(FakeFfmpeg::new().with_duration("00:00:10.00"));
    let request = harness.request();
    let input = request.input_path.to_string_lossy().to_string();
    let output = request.output_path.to_string_lossy().to_string();

    let handle = harness.converter.start(request).await;
    assert!(handle.wait().await.is_success());

    let args = harness.recorded(ARGS_FILE).expect("args recorded");
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args, vec!["-y", "-i", &input, "-c", "copy", &output]);
    assert!(output.ends_with("clip.mp4"));
}

#[tokio::test]
async fn test_non_utf8_paths_reach_ffmpeg_unchanged() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let harness = TestHarness::new(FakeFfmpeg::new().with_duration("00:00:10.00"));
    let input = harness
        .dir
        .path()
        .join(OsStr::from_bytes(b"clip\xff.mkv"));
    let output = harness.dir.path().join(OsStr::from_bytes(b"clip\xff.mp4"));
    let request = ConversionRequest::without_preset(&input, &output);

    let handle = harness.converter.start(request).await;
    assert!(handle.wait().await.is_success());

    let recorded = std::fs::read(harness.dir.path().join(ARGS_FILE)).expect("args recorded");
    let lines: Vec<&[u8]> = recorded.split(|b| *b == b'\n').collect();
    assert!(lines.contains(&input.as_os_str().as_bytes()));
    assert!(lines.contains(&output.as_os_str().as_bytes()));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_ffmpeg_runs_in_its_own_process_group() {
    let harness = TestHarness::new(FakeFfmpeg::new().with_duration("00:00:10.00"));

    let handle = harness.converter.start(harness.request()).await;
    assert!(handle.wait().await.is_success());

    let pid = harness.recorded(PID_FILE).expect("pid recorded");
    let pgid = harness.recorded(PGID_FILE).expect("pgid recorded");
    assert_eq!(pid.trim(), pgid.trim());
}

// =============================================================================
// Failure
// =============================================================================

#[tokio::test]
async fn test_nonzero_exit_fails_once() {
    let harness = TestHarness::new(
        FakeFfmpeg::new()
            .with_duration("00:10:00.00")
            .with_progress(["00:01:00.00"])
            .with_diagnostics(["Error while opening encoder for output stream #0:0"])
            .with_exit_code(1),
    );

    let mut handle = harness.converter.start(harness.request()).await;
    let events = collect(&mut handle).await;

    assert_eq!(percents(&events), vec![10]);
    let terminal = terminals(&events);
    assert_eq!(terminal.len(), 1);
    match terminal[0] {
        ConversionEvent::Failed { message } => {
            assert!(message.contains("exited with code 1"), "{}", message);
            assert!(message.contains("Error while opening encoder"), "{}", message);
        }
        other => panic!("Expected failure, got {:?}", other),
    }
    assert!(events.contains(&ConversionEvent::Done));

    let outcome = handle.wait().await;
    assert_eq!(outcome.state, JobState::Failed);
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn test_spawn_failure_fails_once() {
    let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(
        "/nonexistent/bin/ffmpeg",
    ));
    let mut handle = converter
        .start(ConversionRequest::without_preset("/tmp/in.mov", "/tmp/out.mp4"))
        .await;
    let events = collect(&mut handle).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ConversionEvent::Done);
    assert!(matches!(events[1], ConversionEvent::Failed { .. }));
    assert_eq!(handle.wait().await.state, JobState::Failed);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancel_during_conversion_kills_process() {
    let harness = TestHarness::new(
        FakeFfmpeg::new()
            .with_duration("00:10:00.00")
            .with_progress(["00:01:00.00"])
            .hanging_after_progress(),
    );

    let mut handle = harness.converter.start(harness.request()).await;

    let first = tokio::time::timeout(Duration::from_secs(10), handle.next_event())
        .await
        .expect("Timed out waiting for progress");
    assert!(matches!(first, Some(ConversionEvent::Progress(_))));

    let pid = harness.recorded(PID_FILE).expect("pid recorded");
    assert!(process_alive(&pid));

    handle.cancel();
    handle.cancel();

    let events = collect(&mut handle).await;
    assert!(percents(&events).is_empty());
    assert_eq!(events, vec![ConversionEvent::Done, ConversionEvent::Cancelled]);

    let outcome = handle.wait().await;
    assert_eq!(outcome.state, JobState::Cancelled);
    assert_eq!(outcome.final_percent, 0);
    assert!(!process_alive(&pid));
}

#[tokio::test]
async fn test_cancel_from_another_task() {
    let harness = TestHarness::new(
        FakeFfmpeg::new()
            .with_duration("00:10:00.00")
            .with_progress(["00:01:00.00"])
            .hanging_after_progress(),
    );

    let mut handle = harness.converter.start(harness.request()).await;
    let canceller = handle.canceller();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    let events = collect(&mut handle).await;
    let terminal = terminals(&events);
    assert_eq!(terminal, vec![&ConversionEvent::Cancelled]);
}

#[tokio::test]
async fn test_cancel_during_probe_never_converts() {
    let harness = TestHarness::new(
        FakeFfmpeg::new()
            .with_duration("00:10:00.00")
            .hanging_probe(),
    );

    let mut handle = harness.converter.start(harness.request()).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.cancel();

    let events = collect(&mut handle).await;
    assert_eq!(events, vec![ConversionEvent::Done, ConversionEvent::Cancelled]);
    assert_eq!(handle.wait().await.state, JobState::Cancelled);
    assert!(harness.recorded(ARGS_FILE).is_none());
}

// =============================================================================
// Probing and availability
// =============================================================================

#[tokio::test]
async fn test_probe_duration() {
    let harness = TestHarness::new(FakeFfmpeg::new().with_duration("00:10:00.00"));
    let secs = harness.converter.probe_duration(Path::new("clip.mkv")).await;
    assert_eq!(secs, 600.0);

    let harness = TestHarness::new(FakeFfmpeg::new());
    let secs = harness.converter.probe_duration(Path::new("clip.mkv")).await;
    assert_eq!(secs, FALLBACK_DURATION_SECS);
}

#[tokio::test]
async fn test_probe_duration_silent_tool_falls_back() {
    let harness = TestHarness::new(FakeFfmpeg::new().silent_probe());
    let secs = harness.converter.probe_duration(Path::new("clip.mkv")).await;
    assert_eq!(secs, FALLBACK_DURATION_SECS);
}

#[tokio::test]
async fn test_availability_ok() {
    let harness = TestHarness::new(FakeFfmpeg::new());
    let version = harness.converter.validate().await.unwrap();
    assert!(version.starts_with("ffmpeg version"));
}

#[tokio::test]
async fn test_availability_nonzero_exit() {
    let harness = TestHarness::new(FakeFfmpeg::new().unavailable());
    let err = harness.converter.validate().await.unwrap_err();
    assert!(matches!(err, ConverterError::ToolUnavailable { .. }));
}

#[tokio::test]
async fn test_availability_timeout() {
    let dir = TempDir::new().unwrap();
    let ffmpeg: PathBuf = FakeFfmpeg::new()
        .with_version_delay(5.0)
        .install(dir.path())
        .unwrap();
    let config = ConverterConfig::with_ffmpeg_path(ffmpeg).with_availability_timeout(100);

    let err = check_availability(&config).await.unwrap_err();
    assert!(matches!(
        err,
        ConverterError::AvailabilityTimeout { timeout_ms: 100 }
    ));
}

#[tokio::test]
async fn test_availability_not_found() {
    let config = ConverterConfig::with_ffmpeg_path("/nonexistent/bin/ffmpeg");
    let err = check_availability(&config).await.unwrap_err();
    assert!(matches!(err, ConverterError::FfmpegNotFound { .. }));
    assert!(err.is_unavailable());
}
