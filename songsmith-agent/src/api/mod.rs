//! HTTP API handlers for songsmith-agent
//!
//! REST endpoints for the song workflow plus an SSE stream of pipeline events

pub mod credits;
pub mod genres;
pub mod health;
pub mod settings;
pub mod song_workflow;
pub mod sse;
pub mod ui;

pub use credits::credit_routes;
pub use genres::genre_routes;
pub use health::health_routes;
pub use settings::settings_routes;
pub use song_workflow::song_routes;
pub use sse::event_stream;
pub use ui::ui_routes;
