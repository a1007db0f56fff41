//! Configuration loading, path resolution and atomic TOML write-back
//!
//! Every section of [`TomlConfig`] carries serde defaults, so a partial or
//! empty file is valid. A missing file is never fatal: callers receive the
//! defaults and the file is created on first write.

use crate::{Error, Language, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SONGSMITH_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub text_generation: TextGenerationConfig,
    #[serde(default)]
    pub song_api: SongApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// User preferences persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub language: Language,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "songsmith_agent=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Local text-generation service (Ollama)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGenerationConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_text_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
            timeout_seconds: default_text_timeout(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Remote song-generation API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongApiConfig {
    #[serde(default = "default_song_api_url")]
    pub base_url: String,
    #[serde(default = "default_song_model")]
    pub model: String,
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    /// Bearer token; the `SUNO_API_KEY` environment variable takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for SongApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_song_api_url(),
            model: default_song_model(),
            callback_url: default_callback_url(),
            api_key: None,
        }
    }
}

/// Job polling limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_hard_timeout")]
    pub hard_timeout_seconds: u64,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Expected generation time, only used for the progress estimate
    #[serde(default = "default_expected_duration")]
    pub expected_duration_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
            hard_timeout_seconds: default_hard_timeout(),
            max_consecutive_errors: default_max_consecutive_errors(),
            expected_duration_seconds: default_expected_duration(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5790
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_ollama_model() -> String {
    "gemma3n:e4b".to_string()
}
fn default_text_timeout() -> u64 {
    120
}
fn default_temperature() -> f64 {
    0.8
}
fn default_top_p() -> f64 {
    0.9
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_song_api_url() -> String {
    "https://api.sunoapi.org".to_string()
}
fn default_song_model() -> String {
    "V4_5".to_string()
}
fn default_callback_url() -> String {
    "https://webhook.site/placeholder".to_string()
}
fn default_poll_interval() -> u64 {
    5
}
fn default_hard_timeout() -> u64 {
    600
}
fn default_max_consecutive_errors() -> u32 {
    5
}
fn default_expected_duration() -> u64 {
    240
}

/// Resolve the config file path
///
/// Priority: explicit path (CLI) → `SONGSMITH_CONFIG` → `<config dir>/songsmith/config.toml`
/// → `./config.toml` when the platform has no config directory.
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::config_dir()
        .map(|d| d.join("songsmith").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Load configuration from a TOML file
///
/// Returns defaults when the file is missing. Parse errors are reported so
/// the caller decides whether to degrade.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration, falling back to defaults on any error
///
/// A missing file is created with the defaults (best-effort).
pub fn load_or_init_toml_config(path: &Path) -> TomlConfig {
    if !path.exists() {
        let config = TomlConfig::default();
        match write_toml_config(&config, path) {
            Ok(()) => info!("Created default config: {}", path.display()),
            Err(e) => warn!("Could not create default config {}: {}", path.display(), e),
        }
        return config;
    }

    match load_toml_config(path) {
        Ok(config) => {
            info!("Loaded config: {}", path.display());
            config
        }
        Err(e) => {
            warn!("{} - using defaults", e);
            TomlConfig::default()
        }
    }
}

/// Write configuration atomically (temp file + rename)
///
/// Parent directories are created as needed. On Unix the file is restricted
/// to 0600 because it may hold the API bearer token.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);
    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

/// Update only the persisted language, preserving every other field on disk
pub fn save_language(path: &Path, language: Language) -> Result<()> {
    let mut config = load_toml_config(path)?;
    config.general.language = language;
    write_toml_config(&config, path)
}

/// Returns true if the file is readable by group or others
#[cfg(unix)]
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "config.toml".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.polling.hard_timeout_seconds, 600);
        assert_eq!(config.polling.max_consecutive_errors, 5);
        assert_eq!(config.text_generation.timeout_seconds, 120);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: TomlConfig = toml::from_str("[general]\nlanguage = \"de\"\n").unwrap();
        assert_eq!(config.general.language, Language::De);
        assert_eq!(config.server.port, 5790);
    }

    #[test]
    fn test_temp_path_appends_suffix() {
        let temp = temp_path_for(Path::new("/tmp/x/config.toml"));
        assert_eq!(temp, PathBuf::from("/tmp/x/config.toml.tmp"));
    }
}
