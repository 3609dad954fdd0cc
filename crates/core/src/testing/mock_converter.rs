//! Mock converter for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::converter::{
    Canceller, ConversionEvent, ConversionHandle, ConversionOutcome, ConversionProgress,
    ConversionRequest, Converter, ConverterError, JobState, FALLBACK_DURATION_SECS,
};

/// How a mock conversion ends when it is not cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Emit the final 100%, `Done`, then `Completed`.
    Complete,
    /// Emit `Done`, then `Failed` with this message.
    Fail(String),
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track requests for assertions
/// - Script the progress percentages and their pacing
/// - Simulate failure or an unavailable tool
///
/// Event ordering and cancellation follow the real converter: progress,
/// `Done`, then exactly one terminal event.
///
/// # Example
///
/// ```rust,ignore
/// use leonardo_core::testing::{MockConverter, MockOutcome};
///
/// let converter = MockConverter::new();
/// converter.set_progress_steps(vec![25, 50, 75]).await;
/// converter.set_outcome(MockOutcome::Fail("disk full".into())).await;
///
/// let handle = converter.start(request).await;
/// // ...
/// assert_eq!(converter.request_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    /// Recorded requests.
    requests: Arc<RwLock<Vec<ConversionRequest>>>,
    /// Percentages to report, in order.
    progress_steps: Arc<RwLock<Vec<u8>>>,
    /// Delay before each progress step.
    step_delay_ms: Arc<RwLock<u64>>,
    /// How non-cancelled runs end.
    outcome: Arc<RwLock<MockOutcome>>,
    /// If set, `validate` fails with this reason.
    unavailable: Arc<RwLock<Option<String>>>,
    /// Duration reported by `probe_duration`.
    duration_secs: Arc<RwLock<f64>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            progress_steps: Arc::new(RwLock::new(vec![25, 50, 75])),
            step_delay_ms: Arc::new(RwLock::new(10)),
            outcome: Arc::new(RwLock::new(MockOutcome::Complete)),
            unavailable: Arc::new(RwLock::new(None)),
            duration_secs: Arc::new(RwLock::new(60.0)),
        }
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<ConversionRequest> {
        self.requests.read().await.clone()
    }

    /// Get the number of conversions started.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Set the progress percentages emitted before the outcome.
    pub async fn set_progress_steps(&self, steps: Vec<u8>) {
        *self.progress_steps.write().await = steps;
    }

    /// Set the delay before each progress step.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.step_delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Set how non-cancelled runs end.
    pub async fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.write().await = outcome;
    }

    /// Make `validate` fail with the given reason.
    pub async fn set_unavailable(&self, reason: impl Into<String>) {
        *self.unavailable.write().await = Some(reason.into());
    }

    /// Set the duration returned by `probe_duration`.
    pub async fn set_duration(&self, secs: f64) {
        *self.duration_secs.write().await = secs;
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn validate(&self) -> Result<String, ConverterError> {
        match self.unavailable.read().await.as_ref() {
            Some(reason) => Err(ConverterError::unavailable(reason.clone())),
            None => Ok("mock version 1.0".to_string()),
        }
    }

    async fn probe_duration(&self, _path: &Path) -> f64 {
        *self.duration_secs.read().await
    }

    async fn start(&self, request: ConversionRequest) -> ConversionHandle {
        self.requests.write().await.push(request);

        let steps = self.progress_steps.read().await.clone();
        let delay = Duration::from_millis(*self.step_delay_ms.read().await);
        let outcome = self.outcome.read().await.clone();
        let duration_secs = *self.duration_secs.read().await;
        let duration_secs = if duration_secs > 0.0 {
            duration_secs
        } else {
            FALLBACK_DURATION_SECS
        };

        let job_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(64);
        let (canceller, mut cancel_rx) = Canceller::channel();

        let task = tokio::spawn(async move {
            let started_at = Utc::now();
            let start = Instant::now();
            let progress = |percent: u8| {
                ConversionEvent::Progress(ConversionProgress {
                    job_id,
                    percent,
                    elapsed_secs: duration_secs * f64::from(percent) / 100.0,
                    duration_secs,
                    speed: Some("1.0x".to_string()),
                })
            };

            let mut cancelled = false;
            let mut last_percent = 0;
            for percent in steps {
                tokio::select! {
                    biased;
                    Ok(_) = cancel_rx.wait_for(|c| *c) => {
                        cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                let _ = tx.send(progress(percent)).await;
                last_percent = percent;
            }
            // A cancel racing the last step still wins
            cancelled = cancelled || *cancel_rx.borrow();

            let (state, error, terminal) = if cancelled {
                last_percent = 0;
                (JobState::Cancelled, None, ConversionEvent::Cancelled)
            } else {
                match outcome {
                    MockOutcome::Complete => {
                        last_percent = 100;
                        let _ = tx.send(progress(100)).await;
                        (JobState::Completed, None, ConversionEvent::Completed)
                    }
                    MockOutcome::Fail(message) => (
                        JobState::Failed,
                        Some(message.clone()),
                        ConversionEvent::Failed { message },
                    ),
                }
            };

            let _ = tx.send(ConversionEvent::Done).await;
            let _ = tx.send(terminal).await;

            ConversionOutcome {
                job_id,
                state,
                final_percent: last_percent,
                duration_secs,
                error,
                started_at,
                finished_at: Utc::now(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            }
        });

        ConversionHandle::new(job_id, rx, canceller, task)
    }
}
