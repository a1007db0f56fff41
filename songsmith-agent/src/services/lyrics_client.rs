//! Lyrics generation through a local Ollama server
//!
//! [`OllamaClient`] is the transport ([`TextGenerator`]); [`generate_lyrics`]
//! builds the songwriter prompt, calls the generator once and cleans the output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use songsmith_common::config::TextGenerationConfig;
use songsmith_common::Language;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::{StyleCatalog, StyleDescriptor, CUSTOM_GENRE};
use crate::error::SongError;
use crate::models::LyricsResult;
use crate::services::lyrics_cleaner::{clean_lyrics, MAX_LYRICS_CHARS};

const USER_AGENT: &str = concat!("songsmith/", env!("CARGO_PKG_VERSION"));

/// Text generation client errors
#[derive(Debug, Error)]
pub enum TextGenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Prompt → raw completion
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama `/api/generate` client (non-streaming)
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    options: GenerateOptions,
}

impl OllamaClient {
    pub fn new(config: &TextGenerationConfig) -> Result<Self, TextGenerationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TextGenerationError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: GenerateOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                max_tokens: config.max_tokens,
            },
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, TextGenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.options.clone(),
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Requesting lyrics from Ollama");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TextGenerationError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TextGenerationError::HttpError(status.as_u16(), error_text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TextGenerationError::ParseError(e.to_string()))?;

        tracing::debug!(response_chars = parsed.response.chars().count(), "Ollama response received");

        Ok(parsed.response)
    }
}

/// Songwriter prompt in the operating language
///
/// `descriptor` adds a genre context block; pass `None` for the custom genre
/// or genres missing from the catalog.
pub fn build_prompt(
    description: &str,
    genre: &str,
    style_text: &str,
    descriptor: Option<&StyleDescriptor>,
    language: Language,
) -> String {
    const STRUCTURE: &str = "[Verse 1]\n...\n\n[Pre-Chorus]\n...\n\n[Chorus]\n...\n\n[Verse 2]\n...\n\n\
                             [Pre-Chorus]\n...\n\n[Chorus]\n...\n\n[Bridge]\n...\n\n[Final Chorus]\n...";

    match language {
        Language::En => {
            let genre_context = descriptor
                .map(|d| {
                    format!(
                        "\nGENRE CONTEXT ({genre}):\n- Tempo: {}\n- Typical mood: {}\n- Characteristics: {}\n",
                        d.tempo_range, d.mood, d.description
                    )
                })
                .unwrap_or_default();

            format!(
                "You are a professional songwriter. Write ONLY song lyrics in the correct format.\n\
                 \n\
                 SONG DESCRIPTION: \"{description}\"\n\
                 {genre_context}\n\
                 STYLE: {style_text}\n\
                 \n\
                 IMPORTANT RULES:\n\
                 - Output ONLY the lyrics, NO explanations or comments\n\
                 - Start DIRECTLY with [Verse 1] or [Intro]\n\
                 - Use EXCLUSIVELY this structure:\n\
                 \n\
                 {STRUCTURE}\n\
                 \n\
                 - Maximum {MAX_LYRICS_CHARS} characters\n\
                 - The content must fit the genre \"{genre}\"\n\
                 - NO introductions like \"Here are the lyrics...\" or similar\n\
                 - START IMMEDIATELY with the first song section\n\
                 \n\
                 Generate the lyrics now:"
            )
        }
        Language::De => {
            let genre_context = descriptor
                .map(|d| {
                    format!(
                        "\nGENRE-KONTEXT ({genre}):\n- Tempo: {}\n- Typische Stimmung: {}\n- Charakteristika: {}\n",
                        d.tempo_range, d.mood, d.description
                    )
                })
                .unwrap_or_default();

            format!(
                "Du bist ein professioneller Songwriter. Schreibe AUSSCHLIESSLICH Songtexte im korrekten Format.\n\
                 \n\
                 SONG-BESCHREIBUNG: \"{description}\"\n\
                 {genre_context}\n\
                 STIL: {style_text}\n\
                 \n\
                 WICHTIGE REGELN:\n\
                 - Gib NUR den Songtext aus, KEINE Erklärungen oder Kommentare\n\
                 - Beginne DIREKT mit [Verse 1] oder [Intro]\n\
                 - Verwende AUSSCHLIESSLICH diese Struktur:\n\
                 \n\
                 {STRUCTURE}\n\
                 \n\
                 - Maximal {MAX_LYRICS_CHARS} Zeichen\n\
                 - Inhalt muss zum Genre \"{genre}\" passen\n\
                 - KEINE Einleitungen wie \"Hier ist ein Songtext...\" oder ähnliches\n\
                 - STARTE SOFORT mit dem ersten Song-Abschnitt\n\
                 \n\
                 Generiere jetzt den Songtext:"
            )
        }
    }
}

/// Generate and clean lyrics for one request
///
/// Single attempt. Transport failures and outputs that clean down to nothing
/// both surface as [`SongError::LyricsGenerationFailed`].
pub async fn generate_lyrics(
    generator: &dyn TextGenerator,
    catalog: &StyleCatalog,
    description: &str,
    genre: &str,
    style_text: &str,
    language: Language,
) -> Result<LyricsResult, SongError> {
    if description.trim().is_empty() || style_text.trim().is_empty() {
        return Err(SongError::LyricsGenerationFailed(
            "description and style text are required".to_string(),
        ));
    }

    let descriptor = if genre == CUSTOM_GENRE {
        None
    } else {
        catalog.descriptor(genre, language)
    };
    let prompt = build_prompt(description, genre, style_text, descriptor.as_ref(), language);

    let raw = generator.generate(&prompt).await.map_err(|e| {
        tracing::warn!(genre = %genre, error = %e, "Text generation request failed");
        SongError::LyricsGenerationFailed(e.to_string())
    })?;

    let cleaned = clean_lyrics(&raw);
    if cleaned.is_empty() {
        tracing::warn!(genre = %genre, raw_chars = raw.chars().count(), "Generated text held no lyrics");
        return Err(SongError::LyricsGenerationFailed(
            "generated text was empty after cleanup".to_string(),
        ));
    }

    tracing::info!(genre = %genre, lyrics_chars = cleaned.chars().count(), "Lyrics generated");

    Ok(LyricsResult::new(raw, cleaned, style_text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedGenerator {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedGenerator {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, TextGenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| TextGenerationError::NetworkError("connection refused".into()))
        }
    }

    fn catalog() -> StyleCatalog {
        StyleCatalog::load_builtin().unwrap()
    }

    #[test]
    fn test_prompt_contains_skeleton_and_rules() {
        let catalog = catalog();
        let descriptor = catalog.descriptor("Techno", Language::En);
        let prompt = build_prompt("night drive", "Techno", "STYLE", descriptor.as_ref(), Language::En);

        assert!(prompt.contains("SONG DESCRIPTION: \"night drive\""));
        assert!(prompt.contains("GENRE CONTEXT (Techno):"));
        assert!(prompt.contains("- Tempo: 125-135 BPM"));
        assert!(prompt.contains("STYLE: STYLE"));
        assert!(prompt.contains("Maximum 5000 characters"));
        let order = ["[Verse 1]", "[Pre-Chorus]", "[Chorus]", "[Verse 2]", "[Bridge]", "[Final Chorus]"];
        let mut last = 0;
        for marker in order {
            let pos = prompt[last..].find(marker).map(|p| p + last);
            assert!(pos.is_some(), "missing {}", marker);
            last = pos.unwrap();
        }
    }

    #[test]
    fn test_prompt_language_and_custom_context() {
        let prompt = build_prompt("Liebe", CUSTOM_GENRE, "Dub", None, Language::De);
        assert!(prompt.starts_with("Du bist ein professioneller Songwriter."));
        assert!(prompt.contains("STIL: Dub"));
        assert!(!prompt.contains("GENRE-KONTEXT"));
    }

    #[tokio::test]
    async fn test_generate_lyrics_cleans_output() {
        let generator = FixedGenerator::replying("Here you go:\n[Verse 1]\nla la");
        let result = generate_lyrics(&generator, &catalog(), "desc", "Techno", "style", Language::En)
            .await
            .unwrap();

        assert_eq!(result.cleaned_text(), "[Verse 1]\nla la");
        assert_eq!(result.raw_text(), "Here you go:\n[Verse 1]\nla la");
        assert_eq!(result.style_text_used(), "style");
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cleaned_output_is_failure() {
        let generator = FixedGenerator::replying("   ");
        let result =
            generate_lyrics(&generator, &catalog(), "desc", "Techno", "style", Language::En).await;
        assert!(matches!(result, Err(SongError::LyricsGenerationFailed(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let generator = FixedGenerator::failing();
        let result =
            generate_lyrics(&generator, &catalog(), "desc", "Techno", "style", Language::En).await;
        assert!(matches!(result, Err(SongError::LyricsGenerationFailed(_))));
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected_without_call() {
        let generator = FixedGenerator::replying("[Verse 1]\nx");
        let result =
            generate_lyrics(&generator, &catalog(), " ", "Techno", "style", Language::En).await;
        assert!(result.is_err());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}
