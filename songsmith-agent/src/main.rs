//! songsmith-agent - AI song creation service
//!
//! Turns a short description and a genre into a finished song: lyrics from a
//! local text model, audio from a hosted song-generation API, both offered
//! for download through the web UI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use songsmith_agent::catalog::StyleCatalog;
use songsmith_agent::i18n::Translator;
use songsmith_agent::services::{
    HttpAssetDownloader, OllamaClient, PollPolicy, SongOrchestrator, SongServices, SunoClient,
    TokioClock,
};
use songsmith_agent::AppState;
use songsmith_common::config;
use songsmith_common::events::EventBus;

/// Command-line arguments for songsmith-agent
#[derive(Parser, Debug)]
#[command(name = "songsmith-agent")]
#[command(about = "AI song creation service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "SONGSMITH_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides [server] bind_address)
    #[arg(short, long, env = "SONGSMITH_BIND")]
    bind: Option<String>,

    /// Config file path
    #[arg(short, long, env = "SONGSMITH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = config::resolve_config_path(args.config.as_deref());

    // Log level comes from the config file unless RUST_LOG is set
    let level = config::load_toml_config(&config_path)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "songsmith_agent={0},songsmith_common={0},tower_http={0}",
                    level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting songsmith-agent v{}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    let toml_config = config::load_or_init_toml_config(&config_path);

    #[cfg(unix)]
    if let Ok(true) = config::check_toml_permissions_loose(&config_path) {
        warn!(
            "Config file {} is readable by other users; it may hold the API key",
            config_path.display()
        );
    }

    let (api_key, _) = songsmith_agent::config::resolve_api_key(&toml_config)
        .context("Song API key resolution failed")?;

    let catalog = Arc::new(StyleCatalog::load_builtin().context("Failed to load genre catalog")?);
    let translator =
        Arc::new(Translator::load_builtin().context("Failed to load translations")?);
    info!(genres = catalog.len(), "Genre catalog loaded");

    let text_generator = OllamaClient::new(&toml_config.text_generation)
        .context("Failed to create text generation client")?;
    info!(
        base_url = %toml_config.text_generation.base_url,
        model = %text_generator.model(),
        "Text generation client ready"
    );

    let song_api = SunoClient::new(&toml_config.song_api.base_url, api_key)
        .context("Failed to create song API client")?;
    let downloader = HttpAssetDownloader::new().context("Failed to create download client")?;

    let services = SongServices {
        text_generator: Arc::new(text_generator),
        song_api: Arc::new(song_api),
        downloader: Arc::new(downloader),
        clock: Arc::new(TokioClock::new()),
    };

    let event_bus = EventBus::new(100);
    let orchestrator = Arc::new(SongOrchestrator::new(
        services,
        Arc::clone(&catalog),
        Arc::clone(&translator),
        event_bus.clone(),
        toml_config.song_api.clone(),
        PollPolicy::from(&toml_config.polling),
    ));

    let state = AppState::new(
        orchestrator,
        catalog,
        translator,
        event_bus,
        toml_config.general.language,
        Some(config_path),
    );
    let app = songsmith_agent::build_router(state);

    let bind_address = args
        .bind
        .unwrap_or_else(|| toml_config.server.bind_address.clone());
    let port = args.port.unwrap_or(toml_config.server.port);
    let addr = format!("{}:{}", bind_address, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("songsmith-agent stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
