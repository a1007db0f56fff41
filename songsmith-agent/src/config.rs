//! Configuration resolution for songsmith-agent
//!
//! The song API key is the only secret. Priority: environment → TOML.

use songsmith_common::config::TomlConfig;
use songsmith_common::{Error, Result};
use tracing::{info, warn};

/// Environment variable holding the song API bearer token
pub const API_KEY_ENV: &str = "SUNO_API_KEY";

/// Where the resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Toml,
}

/// Resolve the song API key
///
/// A missing key is fatal at startup.
pub fn resolve_api_key(toml_config: &TomlConfig) -> Result<(String, KeySource)> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .song_api
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Song API key found in both environment and TOML. Using {} (highest priority).",
            API_KEY_ENV
        );
    }

    if let Some(key) = env_key {
        info!("Song API key loaded from environment variable");
        return Ok((key.trim().to_string(), KeySource::Environment));
    }

    if let Some(key) = toml_key {
        info!("Song API key loaded from TOML config");
        return Ok((key.trim().to_string(), KeySource::Toml));
    }

    Err(Error::Config(format!(
        "Song API key not configured. Set it using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: [song_api] api_key = \"your-key\"",
        API_KEY_ENV
    )))
}

/// Non-empty after trimming
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
