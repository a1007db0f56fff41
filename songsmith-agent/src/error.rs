//! Error types for songsmith-agent
//!
//! [`SongError`] is the pipeline error surfaced to the user (always shown
//! through a translation key). [`ApiError`] is the HTTP-layer error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use songsmith_common::Language;
use thiserror::Error;

use crate::i18n::Translator;

/// Why a song request was rejected before it started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestProblem {
    #[error("song description is empty")]
    MissingDescription,

    #[error("custom genre requires a style description")]
    MissingCustomStyle,
}

/// Pipeline error
///
/// None of these trigger an automatic retry; the user starts a new request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SongError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(RequestProblem),

    #[error("Lyrics generation failed: {0}")]
    LyricsGenerationFailed(String),

    #[error("Song submission failed: {0}")]
    Submission(String),

    #[error("Submission response carried no job identifier")]
    MissingJobIdentifier,

    #[error("Aborted after {0} consecutive status query failures")]
    ConnectionErrorsExceeded(u32),

    #[error("Song generation failed with status {status}")]
    JobFailed { status: String },

    #[error("Song generation exceeded {0} seconds")]
    TimeoutExceeded(u64),

    #[error("Generation finished without an audio track")]
    NoAudioProduced,

    #[error("Download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Cancelled by user")]
    Cancelled,
}

impl SongError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SongError::Config(_) => "CONFIG_ERROR",
            SongError::InvalidRequest(_) => "INVALID_REQUEST",
            SongError::LyricsGenerationFailed(_) => "LYRICS_GENERATION_FAILED",
            SongError::Submission(_) => "SUBMISSION_FAILED",
            SongError::MissingJobIdentifier => "MISSING_JOB_IDENTIFIER",
            SongError::ConnectionErrorsExceeded(_) => "CONNECTION_ERRORS_EXCEEDED",
            SongError::JobFailed { .. } => "JOB_FAILED",
            SongError::TimeoutExceeded(_) => "TIMEOUT_EXCEEDED",
            SongError::NoAudioProduced => "NO_AUDIO_PRODUCED",
            SongError::DownloadFailed { .. } => "DOWNLOAD_FAILED",
            SongError::Cancelled => "CANCELLED",
        }
    }

    /// Translation key of the user-facing message
    pub fn i18n_key(&self) -> &'static str {
        match self {
            SongError::Config(_) => "config_error",
            SongError::InvalidRequest(RequestProblem::MissingDescription) => "song_desc_required",
            SongError::InvalidRequest(RequestProblem::MissingCustomStyle) => {
                "custom_style_required"
            }
            SongError::LyricsGenerationFailed(_) => "lyrics_error",
            SongError::Submission(_) => "api_error",
            SongError::MissingJobIdentifier => "task_id_error",
            SongError::ConnectionErrorsExceeded(_) => "connection_errors",
            SongError::JobFailed { .. } => "generation_failed",
            SongError::TimeoutExceeded(_) => "timeout_error",
            SongError::NoAudioProduced => "no_audio_error",
            SongError::DownloadFailed { .. } => "download_error",
            SongError::Cancelled => "cancelled",
        }
    }

    /// Message in the user's language
    pub fn localized(&self, translator: &Translator, language: Language) -> String {
        match self {
            SongError::Config(detail) | SongError::Submission(detail) => {
                translator.format(language, self.i18n_key(), &[("error", detail.as_str())])
            }
            SongError::DownloadFailed { reason, .. } => {
                translator.format(language, self.i18n_key(), &[("error", reason.as_str())])
            }
            _ => translator.text(language, self.i18n_key()),
        }
    }

    /// Audio URL offered as a fallback link when only the download failed
    pub fn direct_link(&self) -> Option<&str> {
        match self {
            SongError::DownloadFailed { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. a song is already in flight
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream service failure (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// songsmith-common error
    #[error("Common error: {0}")]
    Common(#[from] songsmith_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
