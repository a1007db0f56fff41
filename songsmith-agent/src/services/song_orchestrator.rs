//! Song pipeline orchestration
//!
//! Sequences style lookup → lyrics → submission → polling → download for one
//! request and owns the session state. The pipeline runs start-to-finish on a
//! single spawned task; HTTP handlers only read snapshots, cancel, or clear.

use chrono::{Local, Utc};
use songsmith_common::config::SongApiConfig;
use songsmith_common::events::{EventBus, SongEvent};
use songsmith_common::Language;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::catalog::StyleCatalog;
use crate::error::SongError;
use crate::i18n::Translator;
use crate::models::{
    DownloadableArtifact, FailureInfo, GenerationJob, GenerationRequest, SessionBusy,
    SessionSnapshot, SessionState, SongProgress, SongSession,
};
use crate::services::asset_retrieval::AssetDownloader;
use crate::services::job_poller::{poll_job, Clock, PollPhase, PollPolicy, PollProgress};
use crate::services::lyrics_client::{generate_lyrics, TextGenerator};
use crate::services::song_api_client::{SongGenerationApi, SongSubmission};

/// External collaborators of the pipeline
#[derive(Clone)]
pub struct SongServices {
    pub text_generator: Arc<dyn TextGenerator>,
    pub song_api: Arc<dyn SongGenerationApi>,
    pub downloader: Arc<dyn AssetDownloader>,
    pub clock: Arc<dyn Clock>,
}

/// Everything one pipeline run needs, handed out by [`SongOrchestrator::begin`]
#[derive(Debug, Clone)]
pub struct PipelineTicket {
    pub session_id: Uuid,
    pub request: GenerationRequest,
    pub language: Language,
    cancel: CancellationToken,
}

/// Owner of the song session
pub struct SongOrchestrator {
    services: SongServices,
    catalog: Arc<StyleCatalog>,
    translator: Arc<Translator>,
    event_bus: EventBus,
    song_api_config: SongApiConfig,
    policy: PollPolicy,
    session: RwLock<SongSession>,
    last_error: RwLock<Option<String>>,
}

impl SongOrchestrator {
    pub fn new(
        services: SongServices,
        catalog: Arc<StyleCatalog>,
        translator: Arc<Translator>,
        event_bus: EventBus,
        song_api_config: SongApiConfig,
        policy: PollPolicy,
    ) -> Self {
        Self {
            services,
            catalog,
            translator,
            event_bus,
            song_api_config,
            policy,
            session: RwLock::new(SongSession::new()),
            last_error: RwLock::new(None),
        }
    }

    pub fn services(&self) -> &SongServices {
        &self.services
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }

    /// Last completed artifact, if any
    pub async fn artifact(&self) -> Option<Arc<DownloadableArtifact>> {
        self.session.read().await.artifact.clone()
    }

    /// Most recent pipeline failure message (diagnostics)
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Claim the session for a new request
    pub async fn begin(
        &self,
        request: GenerationRequest,
        language: Language,
    ) -> Result<PipelineTicket, SessionBusy> {
        let mut session = self.session.write().await;
        let (session_id, cancel) = session.begin(request.clone(), language)?;

        tracing::info!(
            session_id = %session_id,
            genre = %request.genre_name(),
            instrumental = request.instrumental_only(),
            language = %language,
            "Song session started"
        );

        Ok(PipelineTicket {
            session_id,
            request,
            language,
            cancel,
        })
    }

    /// Claim the session and run the pipeline on a background task
    ///
    /// Returns the snapshot taken right after the session was claimed.
    pub async fn start(
        self: &Arc<Self>,
        request: GenerationRequest,
        language: Language,
    ) -> Result<SessionSnapshot, SessionBusy> {
        let ticket = self.begin(request, language).await?;
        let snapshot = self.snapshot().await;

        let this = Arc::clone(self);
        let session_id = ticket.session_id;
        tokio::spawn(async move {
            tracing::debug!(session_id = %session_id, "Background song pipeline task started");
            let _ = this.run_pipeline(ticket).await;
        });

        Ok(snapshot)
    }

    /// Cancel the in-flight request; false when nothing is running
    pub async fn cancel(&self) -> bool {
        let cancelled = self.session.read().await.request_cancel();
        if cancelled {
            tracing::info!("Song cancellation requested");
        }
        cancelled
    }

    /// Drop stored song data; rejected while a request is in flight
    pub async fn clear(&self) -> Result<(), SessionBusy> {
        self.session.write().await.clear()?;
        self.event_bus.emit_lossy(SongEvent::SessionCleared {
            timestamp: Utc::now(),
        });
        tracing::info!("Song session cleared");
        Ok(())
    }

    /// Run the pipeline for a claimed session to completion
    ///
    /// Records the outcome in the session and broadcasts the matching event.
    pub async fn run_pipeline(
        &self,
        ticket: PipelineTicket,
    ) -> Result<Arc<DownloadableArtifact>, SongError> {
        let session_id = ticket.session_id;
        self.event_bus.emit_lossy(SongEvent::SongSessionStarted {
            session_id,
            genre: ticket.request.genre_name().to_string(),
            instrumental: ticket.request.instrumental_only(),
            timestamp: Utc::now(),
        });

        let result = self.execute(&ticket).await;

        match &result {
            Ok(artifact) => {
                let job_id = {
                    let mut session = self.session.write().await;
                    if session.is_current(session_id) {
                        session.complete(Arc::clone(artifact));
                    }
                    session.job.as_ref().map(|j| j.job_id.clone()).unwrap_or_default()
                };

                tracing::info!(
                    session_id = %session_id,
                    audio_filename = %artifact.audio_filename,
                    size_bytes = artifact.size_bytes(),
                    "Song completed"
                );

                self.event_bus.emit_lossy(SongEvent::SongCompleted {
                    session_id,
                    job_id,
                    title: artifact.metadata.title.clone(),
                    audio_url: artifact.audio_url.clone(),
                    audio_filename: artifact.audio_filename.clone(),
                    lyrics_filename: artifact.lyrics_filename.clone(),
                    timestamp: Utc::now(),
                });
            }
            Err(SongError::Cancelled) => {
                self.update_session(session_id, |s| s.transition_to(SessionState::Cancelled))
                    .await;
                tracing::info!(session_id = %session_id, "Song cancelled");
                self.event_bus.emit_lossy(SongEvent::SongCancelled {
                    session_id,
                    timestamp: Utc::now(),
                });
            }
            Err(error) => {
                let message = error.localized(&self.translator, ticket.language);
                let failure = FailureInfo {
                    code: error.code().to_string(),
                    message: message.clone(),
                    direct_link: error.direct_link().map(str::to_string),
                };

                tracing::error!(
                    session_id = %session_id,
                    code = error.code(),
                    error = %error,
                    "Song pipeline failed"
                );

                *self.last_error.write().await = Some(error.to_string());
                self.update_session(session_id, |s| s.fail(failure.clone())).await;

                self.event_bus.emit_lossy(SongEvent::SongFailed {
                    session_id,
                    error_code: failure.code,
                    message,
                    direct_link: failure.direct_link,
                    timestamp: Utc::now(),
                });
            }
        }

        result
    }

    async fn execute(
        &self,
        ticket: &PipelineTicket,
    ) -> Result<Arc<DownloadableArtifact>, SongError> {
        let session_id = ticket.session_id;
        let request = &ticket.request;
        let language = ticket.language;
        let genre = request.genre_name();

        // Style lookup and lyrics
        let style_text = self
            .catalog
            .style_text(genre, request.custom_style_text(), language);
        self.update_session(session_id, |s| s.style_text = Some(style_text.clone()))
            .await;

        let lyrics = until_cancelled(
            &ticket.cancel,
            generate_lyrics(
                self.services.text_generator.as_ref(),
                &self.catalog,
                request.description(),
                genre,
                &style_text,
                language,
            ),
        )
        .await?;

        self.update_session(session_id, |s| {
            s.lyrics = Some(lyrics.clone());
            s.transition_to(SessionState::Submitting);
        })
        .await;
        self.event_bus.emit_lossy(SongEvent::LyricsGenerated {
            session_id,
            lyrics: lyrics.cleaned_text().to_string(),
            style_text: style_text.clone(),
            timestamp: Utc::now(),
        });

        // Submission
        let submission = SongSubmission::new(
            lyrics.cleaned_text(),
            &style_text,
            request.instrumental_only(),
            &request.title_source(),
            genre,
            &self.song_api_config,
        );
        let job_id = until_cancelled(
            &ticket.cancel,
            self.services.song_api.submit_job(&submission),
        )
        .await?;

        let mut job = GenerationJob::new(job_id.clone());
        self.update_session(session_id, |s| {
            s.job = Some(job.clone());
            s.transition_to(SessionState::Polling);
        })
        .await;
        self.event_bus.emit_lossy(SongEvent::JobSubmitted {
            session_id,
            job_id: job_id.clone(),
            timestamp: Utc::now(),
        });

        // Polling
        let outcome = poll_job(
            self.services.song_api.as_ref(),
            self.services.clock.as_ref(),
            &self.policy,
            &mut job,
            &ticket.cancel,
            move |progress| self.record_progress(session_id, job_id.clone(), language, progress),
        )
        .await;

        self.update_session(session_id, |s| s.job = Some(job.clone()))
            .await;

        match outcome.phase {
            PollPhase::Succeeded => {}
            PollPhase::Failed => {
                return Err(SongError::JobFailed {
                    status: outcome.last_status.unwrap_or_default(),
                })
            }
            PollPhase::TimedOut => {
                return Err(SongError::TimeoutExceeded(self.policy.hard_timeout.as_secs()))
            }
            PollPhase::Aborted => {
                return Err(SongError::ConnectionErrorsExceeded(outcome.consecutive_errors))
            }
            // poll_job only returns terminal phases
            PollPhase::Cancelled | PollPhase::Submitted | PollPhase::Polling => {
                return Err(SongError::Cancelled)
            }
        }

        let audio_url = job
            .result_asset_url
            .clone()
            .ok_or(SongError::NoAudioProduced)?;
        let metadata = job.result_metadata.clone().unwrap_or_default();

        // Download
        self.update_session(session_id, |s| {
            s.transition_to(SessionState::Downloading);
            s.progress.percentage = 100;
        })
        .await;

        let audio_bytes = until_cancelled(
            &ticket.cancel,
            self.services.downloader.download_asset(&audio_url),
        )
        .await?;

        Ok(Arc::new(DownloadableArtifact::new(
            genre,
            &style_text,
            lyrics.cleaned_text(),
            metadata,
            &self.song_api_config.model,
            audio_url,
            audio_bytes,
            Local::now(),
        )))
    }

    async fn record_progress(
        &self,
        session_id: Uuid,
        job_id: String,
        language: Language,
        progress: PollProgress,
    ) {
        let phase = self.translator.text(language, progress.phase.i18n_key());
        let elapsed_seconds = progress.elapsed.as_secs();

        self.update_session(session_id, |s| {
            s.progress = SongProgress {
                percentage: progress.percentage,
                phase: phase.clone(),
                api_status: progress.api_status.clone(),
                elapsed_seconds,
            };
        })
        .await;

        self.event_bus.emit_lossy(SongEvent::JobProgress {
            session_id,
            job_id,
            api_status: progress.api_status,
            percentage: progress.percentage,
            phase,
            elapsed_seconds,
            timestamp: Utc::now(),
        });
    }

    async fn update_session<F>(&self, session_id: Uuid, apply: F)
    where
        F: FnOnce(&mut SongSession),
    {
        let mut session = self.session.write().await;
        if session.is_current(session_id) {
            apply(&mut session);
        }
    }
}

/// Run `step` unless the token fires first
async fn until_cancelled<T, F>(cancel: &CancellationToken, step: F) -> Result<T, SongError>
where
    F: Future<Output = Result<T, SongError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SongError::Cancelled),
        result = step => result,
    }
}
