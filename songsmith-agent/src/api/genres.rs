//! Genre catalog endpoints
//!
//! GET /api/genres, GET /api/genres/:name (live style preview)

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use songsmith_common::Language;

use crate::{
    catalog::{StyleDescriptor, CUSTOM_GENRE},
    error::{ApiError, ApiResult},
    AppState,
};

/// GET /api/genres response
#[derive(Debug, Serialize)]
pub struct GenreListResponse {
    pub genres: Vec<String>,
    /// Name of the entry that takes free-form style text
    pub custom_genre: String,
}

/// GET /api/genres/:name query
#[derive(Debug, Deserialize)]
pub struct GenrePreviewQuery {
    /// Custom style text to preview
    #[serde(default)]
    pub custom: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

/// GET /api/genres/:name response
#[derive(Debug, Serialize)]
pub struct GenrePreviewResponse {
    pub name: String,
    pub language: Language,
    /// Absent for the custom entry
    pub descriptor: Option<StyleDescriptor>,
    /// Text that would be transmitted as the song style
    pub style_text: String,
}

/// GET /api/genres
pub async fn list_genres(State(state): State<AppState>) -> Json<GenreListResponse> {
    Json(GenreListResponse {
        genres: state
            .catalog
            .genre_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        custom_genre: CUSTOM_GENRE.to_string(),
    })
}

/// GET /api/genres/:name
pub async fn preview_genre(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<GenrePreviewQuery>,
) -> ApiResult<Json<GenrePreviewResponse>> {
    if !state.catalog.contains(&name) {
        return Err(ApiError::NotFound(format!("Unknown genre: {}", name)));
    }

    let language = match query.language {
        Some(language) => language,
        None => state.current_language().await,
    };

    let descriptor = if name == CUSTOM_GENRE {
        None
    } else {
        state.catalog.descriptor(&name, language)
    };
    let style_text = state
        .catalog
        .style_text(&name, query.custom.as_deref(), language);

    Ok(Json(GenrePreviewResponse {
        name,
        language,
        descriptor,
        style_text,
    }))
}

/// Build genre routes
pub fn genre_routes() -> Router<AppState> {
    Router::new()
        .route("/api/genres", get(list_genres))
        .route("/api/genres/:name", get(preview_genre))
}
