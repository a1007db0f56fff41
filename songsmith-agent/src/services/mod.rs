//! Services for songsmith-agent
//!
//! - Lyrics generation against a local text model, plus cleanup
//! - Song generation API client (submit, status, credits)
//! - Job polling with progress estimation
//! - Audio download
//! - Pipeline orchestration and session ownership

pub mod asset_retrieval;
pub mod job_poller;
pub mod lyrics_cleaner;
pub mod lyrics_client;
pub mod song_api_client;
pub mod song_orchestrator;

pub use asset_retrieval::{AssetDownloader, HttpAssetDownloader};
pub use job_poller::{
    estimate_progress, next_state, poll_job, Clock, ManualClock, PollInput, PollPhase,
    PollPolicy, PollProgress, PollState, ProgressPhase, TokioClock,
};
pub use lyrics_cleaner::clean_lyrics;
pub use lyrics_client::{
    build_prompt, generate_lyrics, OllamaClient, TextGenerationError, TextGenerator,
};
pub use song_api_client::{CreditLevel, SongApiError, SongGenerationApi, SongSubmission, SunoClient};
pub use song_orchestrator::{PipelineTicket, SongOrchestrator, SongServices};
