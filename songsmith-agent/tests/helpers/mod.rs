//! Shared test doubles for songsmith-agent integration tests
//!
//! - Scripted fakes for the text generator, song API and downloader
//! - In-process axum mock servers bound to 127.0.0.1:0
//! - A harness wiring the fakes into a `SongOrchestrator` on a manual clock

#![allow(dead_code)]

use async_trait::async_trait;
use songsmith_agent::catalog::StyleCatalog;
use songsmith_agent::i18n::Translator;
use songsmith_agent::models::{SessionSnapshot, SessionState, StatusSnapshot, Track};
use songsmith_agent::services::{
    AssetDownloader, ManualClock, PollPolicy, SongApiError, SongGenerationApi, SongOrchestrator,
    SongServices, SongSubmission, TextGenerationError, TextGenerator,
};
use songsmith_agent::{AppState, SongError};
use songsmith_common::config::SongApiConfig;
use songsmith_common::events::EventBus;
use songsmith_common::Language;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SAMPLE_LYRICS: &str = "[Verse 1]\nNeon rain on empty streets\n\n[Chorus]\nWe dance until the morning\n";
pub const AUDIO_URL: &str = "https://cdn.example.test/song.mp3";

// ---------------------------------------------------------------------------
// Text generator
// ---------------------------------------------------------------------------

pub struct FakeTextGenerator {
    reply: Option<Result<String, String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeTextGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(Ok(text.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Some(Err(reason.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Never answers
    pub fn hanging() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(reply) => reply.clone().map_err(TextGenerationError::NetworkError),
            None => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// Song API
// ---------------------------------------------------------------------------

pub struct ScriptedSongApi {
    submit: Result<String, SongError>,
    statuses: Mutex<VecDeque<Result<StatusSnapshot, SongApiError>>>,
    fallback: Result<StatusSnapshot, SongApiError>,
    credits: Result<i64, SongApiError>,
    pub submissions: Mutex<Vec<SongSubmission>>,
    pub queries: AtomicU32,
}

impl ScriptedSongApi {
    /// Accepts every job as "job-1", reports PENDING forever, 100 credits
    pub fn new() -> Self {
        Self {
            submit: Ok("job-1".to_string()),
            statuses: Mutex::new(VecDeque::new()),
            fallback: Ok(pending()),
            credits: Ok(100),
            submissions: Mutex::new(Vec::new()),
            queries: AtomicU32::new(0),
        }
    }

    pub fn with_submit(mut self, result: Result<String, SongError>) -> Self {
        self.submit = result;
        self
    }

    /// Status replies in order; the fallback answers once they run out
    pub fn with_statuses(self, statuses: Vec<Result<StatusSnapshot, SongApiError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_fallback(mut self, fallback: Result<StatusSnapshot, SongApiError>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_credits(mut self, credits: Result<i64, SongApiError>) -> Self {
        self.credits = credits;
        self
    }

    pub fn query_count(&self) -> u32 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<SongSubmission> {
        self.submissions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SongGenerationApi for ScriptedSongApi {
    async fn submit_job(&self, submission: &SongSubmission) -> Result<String, SongError> {
        self.submissions.lock().unwrap().push(submission.clone());
        self.submit.clone()
    }

    async fn query_status(&self, _job_id: &str) -> Result<StatusSnapshot, SongApiError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let scripted = self.statuses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }

    async fn remaining_credits(&self) -> Result<i64, SongApiError> {
        self.credits.clone()
    }
}

pub fn pending() -> StatusSnapshot {
    StatusSnapshot::new("PENDING", Vec::new())
}

pub fn success(audio_url: &str) -> StatusSnapshot {
    StatusSnapshot::new(
        "SUCCESS",
        vec![Track {
            audio_url: Some(audio_url.to_string()),
            title: Some("Neon Rain".to_string()),
            duration_seconds: Some(184.5),
            model_name: Some("chirp-v4-5".to_string()),
        }],
    )
}

pub fn network_error() -> SongApiError {
    SongApiError::NetworkError("connection refused".to_string())
}

// ---------------------------------------------------------------------------
// Downloader
// ---------------------------------------------------------------------------

pub struct FakeDownloader {
    bytes: Option<Vec<u8>>,
    pub urls: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn serving(bytes: &[u8]) -> Self {
        Self {
            bytes: Some(bytes.to_vec()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            bytes: None,
            urls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AssetDownloader for FakeDownloader {
    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, SongError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.bytes.clone().ok_or_else(|| SongError::DownloadFailed {
            url: url.to_string(),
            reason: "HTTP 404".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub orchestrator: Arc<SongOrchestrator>,
    pub event_bus: EventBus,
    pub clock: Arc<ManualClock>,
    pub text: Arc<FakeTextGenerator>,
    pub api: Arc<ScriptedSongApi>,
    pub downloader: Arc<FakeDownloader>,
    pub catalog: Arc<StyleCatalog>,
    pub translator: Arc<Translator>,
}

impl Harness {
    pub fn new(text: FakeTextGenerator, api: ScriptedSongApi, downloader: FakeDownloader) -> Self {
        let text = Arc::new(text);
        let api = Arc::new(api);
        let downloader = Arc::new(downloader);
        let clock = Arc::new(ManualClock::new());
        let catalog = Arc::new(StyleCatalog::load_builtin().unwrap());
        let translator = Arc::new(Translator::load_builtin().unwrap());
        let event_bus = EventBus::new(1000);

        let services = SongServices {
            text_generator: text.clone(),
            song_api: api.clone(),
            downloader: downloader.clone(),
            clock: clock.clone(),
        };

        let orchestrator = Arc::new(SongOrchestrator::new(
            services,
            catalog.clone(),
            translator.clone(),
            event_bus.clone(),
            SongApiConfig::default(),
            PollPolicy::default(),
        ));

        Self {
            orchestrator,
            event_bus,
            clock,
            text,
            api,
            downloader,
            catalog,
            translator,
        }
    }

    /// Everything succeeds: lyrics, job, PENDING twice, then SUCCESS
    pub fn happy() -> Self {
        Self::new(
            FakeTextGenerator::replying(SAMPLE_LYRICS),
            ScriptedSongApi::new().with_statuses(vec![
                Ok(pending()),
                Ok(pending()),
                Ok(success(AUDIO_URL)),
            ]),
            FakeDownloader::serving(b"ID3fake-mp3-bytes"),
        )
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.orchestrator.clone(),
            self.catalog.clone(),
            self.translator.clone(),
            self.event_bus.clone(),
            Language::En,
            None,
        )
    }

    /// Wait (real time, bounded) until the session leaves the in-flight states
    pub async fn wait_until_settled(&self) -> SessionSnapshot {
        for _ in 0..500 {
            let snapshot = self.orchestrator.snapshot().await;
            if !snapshot.state.is_in_flight() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("song session did not settle");
    }

    /// Wait until the session reaches `state`
    pub async fn wait_for_state(&self, state: SessionState) -> SessionSnapshot {
        for _ in 0..500 {
            let snapshot = self.orchestrator.snapshot().await;
            if snapshot.state == state {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("song session never reached {:?}", state);
    }
}

// ---------------------------------------------------------------------------
// Mock HTTP servers
// ---------------------------------------------------------------------------

/// Serve `router` on an ephemeral local port; returns the base URL
pub async fn spawn_mock_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
