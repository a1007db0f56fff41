//! songsmith-agent library interface
//!
//! Exposes the pipeline, clients, and router for integration testing

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, SongError};

use axum::Router;
use chrono::{DateTime, Utc};
use songsmith_common::events::EventBus;
use songsmith_common::Language;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::StyleCatalog;
use crate::i18n::Translator;
use crate::services::SongOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Pipeline and song session owner
    pub orchestrator: Arc<SongOrchestrator>,
    pub catalog: Arc<StyleCatalog>,
    pub translator: Arc<Translator>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Operating language for new requests and the UI
    pub language: Arc<RwLock<Language>>,
    /// TOML file the language choice is written back to; `None` disables persistence
    pub config_path: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<SongOrchestrator>,
        catalog: Arc<StyleCatalog>,
        translator: Arc<Translator>,
        event_bus: EventBus,
        language: Language,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            catalog,
            translator,
            event_bus,
            language: Arc::new(RwLock::new(language)),
            config_path,
            startup_time: Utc::now(),
        }
    }

    pub async fn current_language(&self) -> Language {
        *self.language.read().await
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI routes (HTML page + static assets)
        .merge(api::ui_routes())
        // API routes
        .merge(api::song_routes())
        .merge(api::genre_routes())
        .merge(api::credit_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
