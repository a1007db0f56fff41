//! Credit balance endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{
    error::{ApiError, ApiResult},
    services::CreditLevel,
    AppState,
};

/// GET /api/credits response
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i64,
    pub level: CreditLevel,
    /// Level description in the operating language
    pub message: String,
}

/// GET /api/credits
///
/// Fetches the balance from the song API on every call. 502 on failure.
pub async fn get_credits(State(state): State<AppState>) -> ApiResult<Json<CreditsResponse>> {
    let language = state.current_language().await;

    let credits = state
        .orchestrator
        .services()
        .song_api
        .remaining_credits()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Credit balance query failed");
            ApiError::Upstream(state.translator.text(language, "credits_fetch_error"))
        })?;

    let level = CreditLevel::from_balance(credits);
    tracing::debug!(credits, level = ?level, "Credit balance fetched");

    Ok(Json(CreditsResponse {
        credits,
        level,
        message: state.translator.text(language, level.i18n_key()),
    }))
}

/// Build credit routes
pub fn credit_routes() -> Router<AppState> {
    Router::new().route("/api/credits", get(get_credits))
}
