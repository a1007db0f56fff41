//! Job polling engine
//!
//! The state machine is the pure function [`next_state`]; [`poll_job`] is a
//! thin async driver that feeds it ticks, status snapshots and query failures.
//! Time comes from an injected [`Clock`] so tests run on simulated time.
//!
//! ```text
//! SUBMITTED → POLLING ─┬→ SUCCEEDED
//!                      ├→ FAILED      (provider reported failure/expiry)
//!                      ├→ TIMED_OUT   (hard ceiling exceeded)
//!                      ├→ ABORTED     (too many consecutive query failures)
//!                      └→ CANCELLED   (user cancel)
//! ```

use async_trait::async_trait;
use serde::Serialize;
use songsmith_common::config::PollingConfig;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::{GenerationJob, JobStatus, StatusSnapshot, Track};
use crate::services::song_api_client::SongGenerationApi;

/// Time source for the polling loop
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic time since an arbitrary origin
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time via tokio
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated time: `sleep` advances the clock instantly
#[derive(Debug, Default)]
pub struct ManualClock {
    now_millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now_millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_millis.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

/// Polling limits
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Fixed delay before every status query
    pub interval: Duration,
    /// Elapsed time after which polling gives up
    pub hard_timeout: Duration,
    /// Consecutive query failures that abort polling
    pub max_consecutive_errors: u32,
    /// Expected generation time; only drives the progress estimate
    pub expected_duration: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_seconds),
            hard_timeout: Duration::from_secs(config.hard_timeout_seconds),
            max_consecutive_errors: config.max_consecutive_errors.max(1),
            expected_duration: Duration::from_secs(config.expected_duration_seconds.max(1)),
        }
    }
}

/// Polling state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollPhase {
    Submitted,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
    Cancelled,
}

impl PollPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollPhase::Submitted | PollPhase::Polling)
    }
}

/// Input to one state transition
#[derive(Debug, Clone, PartialEq)]
pub enum PollInput {
    /// Start of an iteration: deadline check
    Tick,
    /// The user asked to stop
    Cancel,
    /// A status query succeeded
    Snapshot(StatusSnapshot),
    /// A status query failed (network, HTTP or parse)
    QueryFailed(String),
}

/// Polling state carried between transitions
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub phase: PollPhase,
    pub consecutive_errors: u32,
    /// Last reported status, uppercased
    pub last_status: Option<String>,
    pub last_error: Option<String>,
    /// Tracks returned with SUCCESS (possibly empty)
    pub tracks: Vec<Track>,
    /// Status queries performed
    pub polls: u32,
}

impl PollState {
    pub fn submitted() -> Self {
        Self {
            phase: PollPhase::Submitted,
            consecutive_errors: 0,
            last_status: None,
            last_error: None,
            tracks: Vec::new(),
            polls: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::submitted()
    }
}

/// Pure polling transition
///
/// Terminal states absorb every input. The hard timeout is only evaluated on
/// [`PollInput::Tick`], so a SUCCESS observed by the last query still counts.
pub fn next_state(
    current: &PollState,
    input: &PollInput,
    elapsed: Duration,
    policy: &PollPolicy,
) -> PollState {
    if current.is_terminal() {
        return current.clone();
    }

    let mut next = current.clone();
    next.phase = PollPhase::Polling;

    match input {
        PollInput::Tick => {
            if elapsed > policy.hard_timeout {
                next.phase = PollPhase::TimedOut;
            }
        }
        PollInput::Cancel => {
            next.phase = PollPhase::Cancelled;
        }
        PollInput::QueryFailed(reason) => {
            next.polls += 1;
            next.consecutive_errors += 1;
            next.last_error = Some(reason.clone());
            if next.consecutive_errors >= policy.max_consecutive_errors {
                next.phase = PollPhase::Aborted;
            }
        }
        PollInput::Snapshot(snapshot) => {
            next.polls += 1;
            next.consecutive_errors = 0;
            next.last_status = Some(snapshot.normalized_status());
            match snapshot.job_status() {
                JobStatus::Success => {
                    next.phase = PollPhase::Succeeded;
                    next.tracks = snapshot.tracks.clone();
                }
                JobStatus::Failed | JobStatus::Expired => next.phase = PollPhase::Failed,
                JobStatus::Pending => {}
            }
        }
    }

    next
}

/// Cosmetic progress label chosen by elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Processing,
    Composing,
    AddingVocals,
    Finalizing,
}

impl ProgressPhase {
    pub fn for_elapsed(elapsed: Duration) -> Self {
        match elapsed.as_secs() {
            0..=30 => ProgressPhase::Processing,
            31..=60 => ProgressPhase::Composing,
            61..=90 => ProgressPhase::AddingVocals,
            _ => ProgressPhase::Finalizing,
        }
    }

    pub fn i18n_key(&self) -> &'static str {
        match self {
            ProgressPhase::Processing => "phase_processing",
            ProgressPhase::Composing => "phase_composing",
            ProgressPhase::AddingVocals => "phase_vocals",
            ProgressPhase::Finalizing => "phase_finalizing",
        }
    }
}

/// `min(elapsed / expected × 100, 95)`
pub fn estimate_progress(elapsed: Duration, policy: &PollPolicy) -> u8 {
    let expected = policy.expected_duration.as_secs_f64().max(1.0);
    let percent = (elapsed.as_secs_f64() / expected * 100.0).floor();
    percent.clamp(0.0, 95.0) as u8
}

/// Progress report emitted after each non-terminal status query
#[derive(Debug, Clone, PartialEq)]
pub struct PollProgress {
    pub elapsed: Duration,
    pub percentage: u8,
    pub phase: ProgressPhase,
    pub api_status: Option<String>,
}

impl PollProgress {
    pub fn new(elapsed: Duration, api_status: Option<String>, policy: &PollPolicy) -> Self {
        Self {
            elapsed,
            percentage: estimate_progress(elapsed, policy),
            phase: ProgressPhase::for_elapsed(elapsed),
            api_status,
        }
    }
}

/// Poll `job` until a terminal state
///
/// Each iteration: deadline and cancel check, the fixed delay (cut short by
/// cancellation), one status query, one transition. Successful snapshots are
/// also folded into `job`. `on_progress` runs after every query that leaves
/// the job running.
pub async fn poll_job<F, Fut>(
    api: &dyn SongGenerationApi,
    clock: &dyn Clock,
    policy: &PollPolicy,
    job: &mut GenerationJob,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> PollState
where
    F: FnMut(PollProgress) -> Fut,
    Fut: Future<Output = ()>,
{
    let started = clock.now();
    let mut state = PollState::submitted();

    loop {
        let elapsed = clock.now().saturating_sub(started);
        let input = if cancel.is_cancelled() {
            PollInput::Cancel
        } else {
            PollInput::Tick
        };
        state = next_state(&state, &input, elapsed, policy);
        if state.is_terminal() {
            break;
        }

        let interrupted = tokio::select! {
            _ = clock.sleep(policy.interval) => false,
            _ = cancel.cancelled() => true,
        };
        if interrupted {
            continue;
        }

        let input = match api.query_status(&job.job_id).await {
            Ok(snapshot) => {
                job.apply_snapshot(&snapshot);
                PollInput::Snapshot(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.job_id,
                    consecutive_errors = state.consecutive_errors + 1,
                    error = %e,
                    "Status query failed"
                );
                PollInput::QueryFailed(e.to_string())
            }
        };

        let elapsed = clock.now().saturating_sub(started);
        state = next_state(&state, &input, elapsed, policy);

        tracing::debug!(
            job_id = %job.job_id,
            phase = ?state.phase,
            status = state.last_status.as_deref().unwrap_or("-"),
            elapsed_secs = elapsed.as_secs(),
            "Poll iteration"
        );

        if state.is_terminal() {
            break;
        }

        on_progress(PollProgress::new(elapsed, state.last_status.clone(), policy)).await;
    }

    tracing::info!(job_id = %job.job_id, phase = ?state.phase, polls = state.polls, "Polling finished");
    state
}
