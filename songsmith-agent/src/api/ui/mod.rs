//! UI routes - song creation page for the songsmith-agent web interface
//!
//! Vanilla HTML/CSS/JS. The page is rendered server-side in the operating
//! language; live updates arrive over `/events`.
//!
//! - **Static Assets** (`static_assets`): CSS/JS file serving
//! - **Root Page** (`root`): genre selection, style preview, song creation

use crate::AppState;
use axum::{routing::get, Router};

mod root;
mod static_assets;

use root::root_page;
use static_assets::{serve_song_agent_js, serve_songsmith_ui_css};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/static/songsmith-ui.css", get(serve_songsmith_ui_css))
        .route("/static/song-agent.js", get(serve_song_agent_js))
}
