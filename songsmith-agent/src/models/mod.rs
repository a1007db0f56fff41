//! Data models for songsmith-agent
//!
//! - Song request validation
//! - Remote job status tracking
//! - Session state machine and completed artifacts

pub mod artifact;
pub mod generation_job;
pub mod generation_request;
pub mod lyrics;
pub mod song_session;

pub use artifact::{genre_slug, DownloadableArtifact};
pub use generation_job::{GenerationJob, JobStatus, StatusSnapshot, Track, TrackMetadata};
pub use generation_request::{GenerationRequest, GenreSelection};
pub use lyrics::LyricsResult;
pub use song_session::{
    ArtifactSummary, FailureInfo, SessionBusy, SessionSnapshot, SessionState, SongProgress,
    SongSession,
};
