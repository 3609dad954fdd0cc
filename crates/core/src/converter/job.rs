//! The conversion job: one ffmpeg run, from probe to terminal event.
//!
//! A job moves `Created -> Running -> {Completed | Failed | Cancelled}`.
//! It owns the child process exclusively and makes sure the process has
//! exited (or been killed) before the terminal event goes out.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::probe::{DurationProbe, FALLBACK_DURATION_SECS};
use super::progress::{extract_elapsed_seconds, extract_speed, percent_complete, TIME_MARKER};
use super::types::{ConversionEvent, ConversionOutcome, ConversionProgress, ConversionRequest, JobState};
use crate::metrics;
use crate::preset::DAVINCI_ARGS;

/// Capacity of the channel merging the child's stdout and stderr.
const LINE_BUFFER: usize = 256;

/// Diagnostic lines kept for the failure message.
const ERROR_TAIL_LINES: usize = 5;

/// Builds the ffmpeg argument vector for a request.
///
/// `[-y] [extra...] -i <input> <preset args...> <output>`
pub fn build_args(config: &ConverterConfig, request: &ConversionRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    if config.overwrite_output {
        args.push("-y".into());
    }
    args.extend(config.extra_ffmpeg_args.iter().map(OsString::from));

    // Paths go through untouched; they need not be valid UTF-8.
    args.push("-i".into());
    args.push(request.input_path.clone().into_os_string());

    match &request.preset {
        Some(preset) => args.extend(preset.args.iter().map(OsString::from)),
        None => args.extend(fallback_args(&request.input_path).into_iter().map(OsString::from)),
    }

    args.push(request.output_path.clone().into_os_string());
    args
}

/// Arguments used when the caller did not pick a preset.
fn fallback_args(input: &Path) -> Vec<String> {
    let is_mp4 = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));

    if is_mp4 {
        DAVINCI_ARGS.iter().map(|a| a.to_string()).collect()
    } else {
        ["-c:v", "libx264", "-c:a", "aac"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

/// Cloneable, cancel-only handle to a running job.
///
/// Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    /// Creates a canceller and the receiver the job listens on.
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        if !self.tx.send_replace(true) {
            debug!("Cancellation requested");
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Caller-side handle to a conversion job.
#[derive(Debug)]
pub struct ConversionHandle {
    job_id: Uuid,
    events: mpsc::Receiver<ConversionEvent>,
    canceller: Canceller,
    task: JoinHandle<ConversionOutcome>,
}

impl ConversionHandle {
    /// Assembles a handle from its parts.
    pub fn new(
        job_id: Uuid,
        events: mpsc::Receiver<ConversionEvent>,
        canceller: Canceller,
        task: JoinHandle<ConversionOutcome>,
    ) -> Self {
        Self {
            job_id,
            events,
            canceller,
            task,
        }
    }

    /// The job's ID.
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Requests cancellation of the job.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// A cancel-only handle that can be moved to another task.
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// Receives the next event, or `None` once the job has finished and all
    /// events have been consumed.
    pub async fn next_event(&mut self) -> Option<ConversionEvent> {
        self.events.recv().await
    }

    /// Waits for the job to finish, discarding unread events.
    pub async fn wait(self) -> ConversionOutcome {
        let Self {
            job_id,
            events,
            task,
            ..
        } = self;
        // The job must never block on a full channel nobody reads.
        drop(events);

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%job_id, "Conversion task aborted: {}", e);
                aborted_outcome(job_id, e.to_string())
            }
        }
    }
}

fn aborted_outcome(job_id: Uuid, message: String) -> ConversionOutcome {
    let now = Utc::now();
    ConversionOutcome {
        job_id,
        state: JobState::Failed,
        final_percent: 0,
        duration_secs: FALLBACK_DURATION_SECS,
        error: Some(message),
        started_at: now,
        finished_at: now,
        elapsed_ms: 0,
    }
}

/// What the read loop saw next.
enum ReadStep {
    Line(String),
    End,
    Failed(std::io::Error),
    Cancelled,
}

/// A single conversion run.
pub struct ConversionJob {
    id: Uuid,
    request: ConversionRequest,
    ffmpeg_path: PathBuf,
    args: Vec<OsString>,
    probe: DurationProbe,
    duration_secs: f64,
    last_percent: u8,
    state: JobState,
    events: mpsc::Sender<ConversionEvent>,
    cancel_rx: watch::Receiver<bool>,
    error_tail: VecDeque<String>,
}

impl ConversionJob {
    /// Creates a job in the `Created` state.
    pub fn new(
        id: Uuid,
        config: &ConverterConfig,
        request: ConversionRequest,
        events: mpsc::Sender<ConversionEvent>,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        let args = build_args(config, &request);
        Self {
            id,
            request,
            ffmpeg_path: config.ffmpeg_path.clone(),
            args,
            probe: DurationProbe::new(config.ffmpeg_path.clone()),
            duration_secs: FALLBACK_DURATION_SECS,
            last_percent: 0,
            state: JobState::Created,
            events,
            cancel_rx,
            error_tail: VecDeque::with_capacity(ERROR_TAIL_LINES),
        }
    }

    /// Creates a job and runs it on the tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn spawn(config: &ConverterConfig, request: ConversionRequest) -> ConversionHandle {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        let (canceller, cancel_rx) = Canceller::channel();
        let job = Self::new(id, config, request, tx, cancel_rx);
        let task = tokio::spawn(job.run());
        ConversionHandle::new(id, rx, canceller, task)
    }

    /// The job's ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Runs the job to its terminal state.
    pub async fn run(mut self) -> ConversionOutcome {
        let started_at = Utc::now();
        let clock = Instant::now();

        self.state = JobState::Running;
        info!(
            job_id = %self.id,
            "Converting {:?} -> {:?}",
            self.request.input_path, self.request.output_path
        );
        debug!(job_id = %self.id, "ffmpeg args: {:?}", self.args);

        let (state, error) = match self.execute().await {
            Ok(()) => (JobState::Completed, None),
            Err(ConverterError::Cancelled) => (JobState::Cancelled, None),
            Err(e) => (JobState::Failed, Some(e.user_message())),
        };
        self.finish(state, error.clone()).await;

        let elapsed = clock.elapsed();
        metrics::CONVERSIONS_TOTAL
            .with_label_values(&[state.as_str()])
            .inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[state.as_str()])
            .observe(elapsed.as_secs_f64());

        ConversionOutcome {
            job_id: self.id,
            state: self.state,
            final_percent: self.last_percent,
            duration_secs: self.duration_secs,
            error,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    async fn execute(&mut self) -> Result<(), ConverterError> {
        let input = self.request.input_path.clone();
        let probed = tokio::select! {
            biased;
            _ = cancelled(&mut self.cancel_rx) => None,
            secs = self.probe.probe(&input) => Some(secs),
        };
        match probed {
            Some(secs) if !*self.cancel_rx.borrow() => self.duration_secs = secs,
            _ => return Err(ConverterError::Cancelled),
        }

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group: a terminal Ctrl-C must not reach ffmpeg directly,
        // only the canceller ends it.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| ConverterError::from_spawn(e, &self.ffmpeg_path))?;

        let mut lines = merge_output(&mut child);

        loop {
            let step = tokio::select! {
                biased;
                _ = cancelled(&mut self.cancel_rx) => ReadStep::Cancelled,
                next = lines.recv() => match next {
                    Some(Ok(line)) => ReadStep::Line(line),
                    Some(Err(e)) => ReadStep::Failed(e),
                    None => ReadStep::End,
                },
            };

            match step {
                ReadStep::Line(line) => self.handle_line(&line),
                ReadStep::End => break,
                ReadStep::Cancelled => return kill_child(self.id, &mut child).await,
                // The child is dropped here; kill_on_drop reaps it.
                ReadStep::Failed(e) => return Err(ConverterError::Io(e)),
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancelled(&mut self.cancel_rx) => None,
            status = child.wait() => Some(status),
        };
        let Some(status) = status else {
            return kill_child(self.id, &mut child).await;
        };
        let status = status?;

        if !status.success() {
            let reason = match status.code() {
                Some(code) => format!("ffmpeg exited with code {}", code),
                None => format!("ffmpeg terminated abnormally ({})", status),
            };
            let stderr = (!self.error_tail.is_empty())
                .then(|| Vec::from(self.error_tail.clone()).join("\n"));
            return Err(ConverterError::conversion_failed(reason, stderr));
        }

        Ok(())
    }

    fn handle_line(&mut self, line: &str) {
        if line.contains("Error") || line.contains("error") {
            if self.error_tail.len() == ERROR_TAIL_LINES {
                self.error_tail.pop_front();
            }
            self.error_tail.push_back(line.trim().to_string());
        }

        if !line.contains(TIME_MARKER) {
            return;
        }

        let elapsed_secs = extract_elapsed_seconds(line);
        let percent = percent_complete(elapsed_secs, self.duration_secs);
        self.last_percent = percent;

        let progress = ConversionProgress {
            job_id: self.id,
            percent,
            elapsed_secs,
            duration_secs: self.duration_secs,
            speed: extract_speed(line),
        };
        if let Err(TrySendError::Full(_)) = self.events.try_send(ConversionEvent::Progress(progress)) {
            debug!(job_id = %self.id, "Event buffer full, dropping progress {}%", percent);
        }
    }

    /// Emits the closing events: final progress (on completion), `Done`,
    /// then the terminal event.
    async fn finish(&mut self, state: JobState, error: Option<String>) {
        let terminal = match state {
            JobState::Completed => {
                self.last_percent = 100;
                let progress = ConversionProgress {
                    job_id: self.id,
                    percent: 100,
                    elapsed_secs: self.duration_secs,
                    duration_secs: self.duration_secs,
                    speed: None,
                };
                self.send(ConversionEvent::Progress(progress)).await;
                info!(job_id = %self.id, "Conversion complete: {:?}", self.request.output_path);
                ConversionEvent::Completed
            }
            JobState::Cancelled => {
                self.last_percent = 0;
                info!(job_id = %self.id, "Conversion cancelled");
                ConversionEvent::Cancelled
            }
            _ => {
                let message = error.unwrap_or_else(|| "unknown error".to_string());
                warn!(job_id = %self.id, "Conversion failed: {}", message);
                ConversionEvent::Failed { message }
            }
        };

        self.state = state;
        self.send(ConversionEvent::Done).await;
        self.send(terminal).await;
    }

    async fn send(&self, event: ConversionEvent) {
        if self.events.send(event).await.is_err() {
            debug!(job_id = %self.id, "Event receiver dropped");
        }
    }
}

/// Resolves once cancellation is requested; never resolves if every
/// canceller is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Hard-kills and reaps the child, then reports cancellation.
async fn kill_child(job_id: Uuid, child: &mut Child) -> Result<(), ConverterError> {
    info!(%job_id, "Killing ffmpeg (pid {:?})", child.id());
    if let Err(e) = child.kill().await {
        warn!(%job_id, "Failed to kill ffmpeg: {}", e);
    }
    Err(ConverterError::Cancelled)
}

/// Merges the child's stdout and stderr into one stream of lines.
fn merge_output(child: &mut Child) -> mpsc::Receiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx));
    }
    rx
}

/// Forwards lines from `reader`. ffmpeg ends its status lines with `\r`,
/// so both `\r` and `\n` terminate a line.
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<std::io::Result<String>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut segments = BufReader::new(reader).split(b'\r');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    if tx.send(Ok(line.to_string())).await.is_err() {
                        return;
                    }
                }
            }
            Ok(None) => return,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        }
    }
}
