//! Settings API endpoints
//!
//! GET/POST /api/settings/language, GET /api/translations

use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use songsmith_common::Language;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Selectable language
#[derive(Debug, Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub name: &'static str,
}

/// GET /api/settings/language response
#[derive(Debug, Serialize)]
pub struct LanguageSettingsResponse {
    pub language: Language,
    pub available: Vec<LanguageOption>,
}

/// POST /api/settings/language request
#[derive(Debug, Deserialize)]
pub struct SetLanguageRequest {
    pub language: Language,
}

/// POST /api/settings/language response
#[derive(Debug, Serialize)]
pub struct SetLanguageResponse {
    pub language: Language,
    /// False when the choice could not be written to the config file
    pub persisted: bool,
}

/// GET /api/translations response
#[derive(Debug, Serialize)]
pub struct TranslationsResponse {
    pub language: Language,
    pub strings: BTreeMap<String, String>,
}

/// GET /api/settings/language
pub async fn get_language(State(state): State<AppState>) -> Json<LanguageSettingsResponse> {
    Json(LanguageSettingsResponse {
        language: state.current_language().await,
        available: Language::ALL
            .iter()
            .map(|l| LanguageOption {
                code: l.code(),
                name: l.display_name(),
            })
            .collect(),
    })
}

/// POST /api/settings/language
///
/// **Request:** `{"language": "de"}`
///
/// The in-memory switch always succeeds. The TOML write-back is best-effort:
/// failures log a warning and are reported as `persisted: false`.
pub async fn set_language(
    State(state): State<AppState>,
    Json(payload): Json<SetLanguageRequest>,
) -> Json<SetLanguageResponse> {
    *state.language.write().await = payload.language;
    info!(language = %payload.language, "Operating language changed");

    let persisted = match &state.config_path {
        Some(path) => match songsmith_common::config::save_language(path, payload.language) {
            Ok(()) => {
                info!("Language saved to TOML: {}", path.display());
                true
            }
            Err(e) => {
                warn!("Language TOML write failed: {}", e);
                false
            }
        },
        None => false,
    };

    Json(SetLanguageResponse {
        language: payload.language,
        persisted,
    })
}

/// GET /api/translations
///
/// UI strings for the operating language, English filling any gaps
pub async fn get_translations(State(state): State<AppState>) -> Json<TranslationsResponse> {
    let language = state.current_language().await;
    let strings = state
        .translator
        .table(language)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Json(TranslationsResponse { language, strings })
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/settings/language",
            get(get_language).post(set_language),
        )
        .route("/api/translations", get(get_translations))
}
