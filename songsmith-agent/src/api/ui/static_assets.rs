//! Static asset handlers for the songsmith-agent UI
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const SONGSMITH_UI_CSS: &str = include_str!("../../../../songsmith-common/static/songsmith-ui.css");
const SONG_AGENT_JS: &str = include_str!("../../../static/song-agent.js");

/// GET /static/songsmith-ui.css
///
/// Serves the shared UI styles from songsmith-common
pub async fn serve_songsmith_ui_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        SONGSMITH_UI_CSS,
    )
        .into_response()
}

/// GET /static/song-agent.js
pub async fn serve_song_agent_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        SONG_AGENT_JS,
    )
        .into_response()
}
