//! Song workflow API handlers
//!
//! POST /api/song, GET /api/song, POST /api/song/cancel, DELETE /api/song,
//! GET /api/song/audio, GET /api/song/lyrics

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use songsmith_common::Language;

use crate::{
    error::{ApiError, ApiResult},
    models::{GenerationRequest, GenreSelection, SessionSnapshot},
    AppState,
};

/// POST /api/song request
#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    pub description: String,
    pub genre: String,
    /// Required when `genre` is the custom entry
    #[serde(default)]
    pub custom_style: Option<String>,
    #[serde(default)]
    pub instrumental: bool,
    /// Overrides the operating language for this request
    #[serde(default)]
    pub language: Option<Language>,
}

/// POST /api/song/cancel response
#[derive(Debug, Serialize)]
pub struct CancelSongResponse {
    pub cancelled: bool,
}

/// POST /api/song
///
/// Validate the request and start the pipeline. Returns 202 Accepted with the
/// session snapshot; the outcome arrives over `/events` and `GET /api/song`.
pub async fn create_song(
    State(state): State<AppState>,
    Json(body): Json<CreateSongRequest>,
) -> ApiResult<(StatusCode, Json<SessionSnapshot>)> {
    let language = match body.language {
        Some(language) => language,
        None => state.current_language().await,
    };

    if body.genre.trim().is_empty() {
        return Err(ApiError::BadRequest(
            state.translator.text(language, "choose_genre"),
        ));
    }

    let request = GenerationRequest::new(
        &body.description,
        GenreSelection::from_name(&body.genre),
        body.custom_style.as_deref(),
        body.instrumental,
    )
    .map_err(|e| ApiError::BadRequest(e.localized(&state.translator, language)))?;

    let snapshot = state
        .orchestrator
        .start(request, language)
        .await
        .map_err(|_| ApiError::Conflict(state.translator.text(language, "request_in_flight")))?;

    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// GET /api/song
pub async fn get_song(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

/// POST /api/song/cancel
///
/// Cooperative: the pipeline stops at its next cancellation point.
pub async fn cancel_song(State(state): State<AppState>) -> Json<CancelSongResponse> {
    Json(CancelSongResponse {
        cancelled: state.orchestrator.cancel().await,
    })
}

/// DELETE /api/song
///
/// Drops the stored song. 409 while a request is in flight.
pub async fn clear_song(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.orchestrator.clear().await.map_err(|_| {
        ApiError::Conflict("Cannot clear while a song request is in flight".to_string())
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/song/audio
pub async fn download_audio(State(state): State<AppState>) -> ApiResult<Response> {
    let artifact = state
        .orchestrator
        .artifact()
        .await
        .ok_or_else(|| ApiError::NotFound("No song available".to_string()))?;

    Ok(attachment(
        "audio/mpeg",
        &artifact.audio_filename,
        artifact.audio_bytes.clone(),
    ))
}

/// GET /api/song/lyrics
pub async fn download_lyrics(State(state): State<AppState>) -> ApiResult<Response> {
    let artifact = state
        .orchestrator
        .artifact()
        .await
        .ok_or_else(|| ApiError::NotFound("No song available".to_string()))?;

    Ok(attachment(
        "text/plain; charset=utf-8",
        &artifact.lyrics_filename,
        artifact.lyrics_text.clone().into_bytes(),
    ))
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Build song workflow routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/song",
            get(get_song).post(create_song).delete(clear_song),
        )
        .route("/api/song/cancel", post(cancel_song))
        .route("/api/song/audio", get(download_audio))
        .route("/api/song/lyrics", get(download_lyrics))
}
