//! Song session state machine
//!
//! One session per process: IDLE → GENERATING_LYRICS → SUBMITTING → POLLING →
//! DOWNLOADING → COMPLETED, with FAILED and CANCELLED as the other outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use songsmith_common::Language;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{DownloadableArtifact, GenerationJob, GenerationRequest, LyricsResult, TrackMetadata};

/// Session workflow state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[default]
    Idle,
    GeneratingLyrics,
    Submitting,
    Polling,
    Downloading,
    Completed,
    Failed,
    Cancelled,
}

impl SessionState {
    /// A pipeline task is running for this state
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SessionState::GeneratingLyrics
                | SessionState::Submitting
                | SessionState::Polling
                | SessionState::Downloading
        )
    }
}

/// Cosmetic progress shown while polling
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SongProgress {
    /// 0-100
    pub percentage: u8,
    /// Localized phase label
    pub phase: String,
    pub api_status: Option<String>,
    pub elapsed_seconds: u64,
}

/// User-visible failure of the last request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureInfo {
    pub code: String,
    pub message: String,
    pub direct_link: Option<String>,
}

/// Rejection when a request is already running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("A song request is already in flight")]
pub struct SessionBusy;

/// Session-scoped pipeline context
///
/// Owned by the orchestrator behind a lock; the pipeline task is the only writer
/// while a request is in flight.
#[derive(Debug, Default)]
pub struct SongSession {
    pub session_id: Option<Uuid>,
    pub state: SessionState,
    pub language: Language,
    pub request: Option<GenerationRequest>,
    pub style_text: Option<String>,
    pub lyrics: Option<LyricsResult>,
    pub job: Option<GenerationJob>,
    pub progress: SongProgress,
    pub error: Option<FailureInfo>,
    /// Last completed song; survives new requests until replaced or cleared
    pub artifact: Option<Arc<DownloadableArtifact>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    cancel_token: Option<CancellationToken>,
}

impl SongSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.is_in_flight()
    }

    /// Start a new request
    ///
    /// Resets the per-request fields but keeps the last artifact. Returns the
    /// new session id and the token that cancels this request.
    pub fn begin(
        &mut self,
        request: GenerationRequest,
        language: Language,
    ) -> Result<(Uuid, CancellationToken), SessionBusy> {
        if self.is_in_flight() {
            return Err(SessionBusy);
        }

        let session_id = Uuid::new_v4();
        let token = CancellationToken::new();

        self.session_id = Some(session_id);
        self.state = SessionState::GeneratingLyrics;
        self.language = language;
        self.request = Some(request);
        self.style_text = None;
        self.lyrics = None;
        self.job = None;
        self.progress = SongProgress::default();
        self.error = None;
        self.started_at = Some(Utc::now());
        self.ended_at = None;
        self.cancel_token = Some(token.clone());

        Ok((session_id, token))
    }

    /// Whether `session_id` is the request currently owning the session
    pub fn is_current(&self, session_id: Uuid) -> bool {
        self.session_id == Some(session_id)
    }

    pub fn transition_to(&mut self, state: SessionState) {
        self.state = state;
        if !state.is_in_flight() && state != SessionState::Idle {
            self.ended_at = Some(Utc::now());
            self.cancel_token = None;
        }
    }

    pub fn complete(&mut self, artifact: Arc<DownloadableArtifact>) {
        self.progress.percentage = 100;
        self.artifact = Some(artifact);
        self.transition_to(SessionState::Completed);
    }

    pub fn fail(&mut self, failure: FailureInfo) {
        self.error = Some(failure);
        self.transition_to(SessionState::Failed);
    }

    /// Signal cancellation of the in-flight request
    ///
    /// Returns false when nothing is running.
    pub fn request_cancel(&self) -> bool {
        match (&self.cancel_token, self.is_in_flight()) {
            (Some(token), true) => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Drop all stored song data, including the last artifact
    pub fn clear(&mut self) -> Result<(), SessionBusy> {
        if self.is_in_flight() {
            return Err(SessionBusy);
        }
        *self = SongSession {
            language: self.language,
            ..SongSession::default()
        };
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            state: self.state,
            language: self.language,
            genre: self.request.as_ref().map(|r| r.genre_name().to_string()),
            description: self.request.as_ref().map(|r| r.description().to_string()),
            instrumental_only: self.request.as_ref().map(|r| r.instrumental_only()),
            style_text: self.style_text.clone(),
            lyrics: self.lyrics.as_ref().map(|l| l.cleaned_text().to_string()),
            job_id: self.job.as_ref().map(|j| j.job_id.clone()),
            job_status: self.job.as_ref().and_then(|j| j.raw_status.clone()),
            progress: self.progress.clone(),
            error: self.error.clone(),
            artifact: self.artifact.as_deref().map(ArtifactSummary::from),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

/// Serializable view of the session for the JSON API
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub state: SessionState,
    pub language: Language,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub instrumental_only: Option<bool>,
    pub style_text: Option<String>,
    pub lyrics: Option<String>,
    pub job_id: Option<String>,
    pub job_status: Option<String>,
    pub progress: SongProgress,
    pub error: Option<FailureInfo>,
    pub artifact: Option<ArtifactSummary>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Download metadata of the stored artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub audio_filename: String,
    pub lyrics_filename: String,
    pub genre: String,
    pub audio_url: String,
    pub size_bytes: usize,
    pub metadata: TrackMetadata,
    pub created_at: String,
}

impl From<&DownloadableArtifact> for ArtifactSummary {
    fn from(artifact: &DownloadableArtifact) -> Self {
        Self {
            audio_filename: artifact.audio_filename.clone(),
            lyrics_filename: artifact.lyrics_filename.clone(),
            genre: artifact.genre.clone(),
            audio_url: artifact.audio_url.clone(),
            size_bytes: artifact.size_bytes(),
            metadata: artifact.metadata.clone(),
            created_at: artifact.created_at.to_rfc3339(),
        }
    }
}
