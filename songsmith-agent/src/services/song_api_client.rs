//! Song-generation API client (sunoapi.org)
//!
//! Three endpoints:
//! - `POST /api/v1/generate` creates a job
//! - `GET /api/v1/generate/record-info?taskId=` reports its status
//! - `GET /api/v1/generate/credit` returns the remaining credit balance
//!
//! Response parsing works on `serde_json::Value` because the provider is loose
//! about field names and shapes.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use songsmith_common::config::SongApiConfig;
use std::time::Duration;
use thiserror::Error;

use crate::error::SongError;
use crate::models::{StatusSnapshot, Track};
use crate::services::lyrics_cleaner::{truncate_chars, MAX_LYRICS_CHARS};

const USER_AGENT: &str = concat!("songsmith/", env!("CARGO_PKG_VERSION"));
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(45);
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum style text length accepted by the service
pub const MAX_STYLE_CHARS: usize = 1000;
/// Maximum title length accepted by the service
pub const MAX_TITLE_CHARS: usize = 80;
const ELLIPSIS: char = '…';

/// Keys that may carry the job identifier, in lookup order
pub const JOB_ID_CANDIDATES: &[&str] = &["taskId", "task_id", "id", "task_uuid"];

/// Song API client errors
#[derive(Debug, Clone, Error)]
pub enum SongApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    #[error("API error {code}: {message}")]
    ApiError { code: i64, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Remote song-generation service
#[async_trait]
pub trait SongGenerationApi: Send + Sync {
    /// Create a job; returns its identifier
    async fn submit_job(&self, submission: &SongSubmission) -> Result<String, SongError>;

    /// Query a job's current status
    async fn query_status(&self, job_id: &str) -> Result<StatusSnapshot, SongApiError>;

    /// Remaining credit balance
    async fn remaining_credits(&self) -> Result<i64, SongApiError>;
}

/// Creation request body, already clamped to the service limits
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSubmission {
    pub model: String,
    pub custom_mode: bool,
    pub instrumental: bool,
    pub style: String,
    /// Lyrics
    pub prompt: String,
    pub title: String,
    #[serde(rename = "callBackUrl")]
    pub callback_url: String,
}

impl SongSubmission {
    /// Build a submission, truncating lyrics and style and shortening the title
    ///
    /// `title_source` is usually "{genre}: {description}"; when it shortens to
    /// nothing the title becomes "AI-Generated {genre} Song".
    pub fn new(
        lyrics: &str,
        style_text: &str,
        instrumental: bool,
        title_source: &str,
        genre: &str,
        config: &SongApiConfig,
    ) -> Self {
        let title = shorten_title(title_source, MAX_TITLE_CHARS);
        let title = if title.is_empty() {
            format!("AI-Generated {} Song", genre)
        } else {
            title
        };

        Self {
            model: config.model.clone(),
            custom_mode: true,
            instrumental,
            style: truncate_chars(style_text, MAX_STYLE_CHARS).to_string(),
            prompt: truncate_chars(lyrics, MAX_LYRICS_CHARS).to_string(),
            title,
            callback_url: config.callback_url.clone(),
        }
    }
}

/// Collapse whitespace and fit `text` into `width` characters
///
/// Whole words are kept while they fit together with a trailing `…`. A first
/// word longer than the width is cut hard.
pub fn shorten_title(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }
    if width == 0 {
        return String::new();
    }

    let budget = width - 1;
    let mut shortened = String::new();
    let mut used = 0;
    for word in &words {
        let word_len = word.chars().count();
        let needed = if shortened.is_empty() { word_len } else { word_len + 1 };
        if used + needed > budget {
            break;
        }
        if !shortened.is_empty() {
            shortened.push(' ');
        }
        shortened.push_str(word);
        used += needed;
    }

    if shortened.is_empty() {
        shortened = truncate_chars(&collapsed, budget).to_string();
    }
    shortened.push(ELLIPSIS);
    shortened
}

/// Find the job identifier in a creation response
///
/// Candidates are searched inside `data` first (an object, or the first
/// element when it is a list), then at the top level. The first non-empty
/// string or number wins.
pub fn extract_job_id(response: &Value) -> Option<String> {
    let data = match response.get("data") {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };

    data.into_iter()
        .chain(std::iter::once(response))
        .filter(|v| v.is_object())
        .find_map(|object| JOB_ID_CANDIDATES.iter().find_map(|key| id_value(object.get(*key)?)))
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reject creation responses whose `code` is present and not 200/201
pub fn check_response_code(response: &Value) -> Result<(), SongError> {
    match response.get("code") {
        None | Some(Value::Null) => Ok(()),
        Some(code) if code.as_i64() == Some(200) || code.as_i64() == Some(201) => Ok(()),
        Some(code) => {
            let message = response
                .get("msg")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Unexpected response code {}", code));
            Err(SongError::Submission(message))
        }
    }
}

/// Parse a status response into a snapshot
///
/// Status lives at `data.status`, tracks at `data.response.sunoData`.
pub fn parse_status_response(response: &Value) -> Result<StatusSnapshot, SongApiError> {
    if !response.is_object() {
        return Err(SongApiError::ParseError(
            "status response is not a JSON object".to_string(),
        ));
    }

    let data = response.get("data");
    let status = data
        .and_then(|d| d.get("status"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let tracks = data
        .and_then(|d| d.get("response"))
        .and_then(|r| r.get("sunoData"))
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_track).collect())
        .unwrap_or_default();

    Ok(StatusSnapshot::new(status, tracks))
}

fn parse_track(value: &Value) -> Track {
    let text = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| value.get(*k).and_then(Value::as_str))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    Track {
        audio_url: text(&["audioUrl", "audio_url"]),
        title: text(&["title"]),
        duration_seconds: value.get("duration").and_then(Value::as_f64),
        model_name: text(&["model_name", "modelName"]),
    }
}

/// Parse the credit endpoint reply: `data` is the balance when `code == 200`
pub fn parse_credits_response(response: &Value) -> Result<i64, SongApiError> {
    let code = response.get("code").and_then(Value::as_i64);
    if code != Some(200) {
        return Err(SongApiError::ApiError {
            code: code.unwrap_or_default(),
            message: response
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string(),
        });
    }

    response
        .get("data")
        .and_then(|d| d.as_i64().or_else(|| d.as_f64().map(|f| f as i64)))
        .ok_or_else(|| SongApiError::ParseError("credit balance missing".to_string()))
}

/// Credit balance classification shown next to the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditLevel {
    Low,
    RunningLow,
    Sufficient,
}

impl CreditLevel {
    pub fn from_balance(credits: i64) -> Self {
        if credits < 10 {
            CreditLevel::Low
        } else if credits < 50 {
            CreditLevel::RunningLow
        } else {
            CreditLevel::Sufficient
        }
    }

    pub fn i18n_key(&self) -> &'static str {
        match self {
            CreditLevel::Low => "low_credits_warning",
            CreditLevel::RunningLow => "credits_running_low",
            CreditLevel::Sufficient => "sufficient_credits",
        }
    }
}

/// Bearer-authenticated sunoapi.org client
pub struct SunoClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SunoClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, SongApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SongApiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, SongApiError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SongApiError::HttpError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| SongApiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl SongGenerationApi for SunoClient {
    async fn submit_job(&self, submission: &SongSubmission) -> Result<String, SongError> {
        let url = format!("{}/api/v1/generate", self.base_url);

        tracing::debug!(
            title = %submission.title,
            instrumental = submission.instrumental,
            lyrics_chars = submission.prompt.chars().count(),
            "Submitting song job"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(SUBMIT_TIMEOUT)
            .json(submission)
            .send()
            .await
            .map_err(|e| SongError::Submission(format!("Network error: {}", e)))?;

        let body = Self::read_json(response)
            .await
            .map_err(|e| SongError::Submission(e.to_string()))?;

        check_response_code(&body)?;

        let job_id = extract_job_id(&body).ok_or(SongError::MissingJobIdentifier)?;
        tracing::info!(job_id = %job_id, "Song job accepted");
        Ok(job_id)
    }

    async fn query_status(&self, job_id: &str) -> Result<StatusSnapshot, SongApiError> {
        let url = format!("{}/api/v1/generate/record-info", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(QUERY_TIMEOUT)
            .query(&[("taskId", job_id.trim())])
            .send()
            .await
            .map_err(|e| SongApiError::NetworkError(e.to_string()))?;

        let body = Self::read_json(response).await?;
        parse_status_response(&body)
    }

    async fn remaining_credits(&self) -> Result<i64, SongApiError> {
        let url = format!("{}/api/v1/generate/credit", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(QUERY_TIMEOUT)
            .send()
            .await
            .map_err(|e| SongApiError::NetworkError(e.to_string()))?;

        let body = Self::read_json(response).await?;
        parse_credits_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_id_prefers_data_over_top_level() {
        let response = json!({"id": "top", "data": {"taskId": "inner"}});
        assert_eq!(extract_job_id(&response).as_deref(), Some("inner"));
    }

    #[test]
    fn test_job_id_candidate_order_within_object() {
        let response = json!({"data": {"id": "generic", "task_id": "snake"}});
        assert_eq!(extract_job_id(&response).as_deref(), Some("snake"));
    }

    #[test]
    fn test_job_id_from_first_list_element() {
        let response = json!({"data": [{"task_uuid": "u-1"}, {"taskId": "second"}]});
        assert_eq!(extract_job_id(&response).as_deref(), Some("u-1"));
    }

    #[test]
    fn test_job_id_skips_empty_and_accepts_numbers() {
        let response = json!({"data": {"taskId": ""}, "id": 4711});
        assert_eq!(extract_job_id(&response).as_deref(), Some("4711"));
    }

    #[test]
    fn test_job_id_missing() {
        assert_eq!(extract_job_id(&json!({"code": 200, "data": null})), None);
        assert_eq!(extract_job_id(&json!({"data": "text"})), None);
    }

    #[test]
    fn test_response_code_check() {
        assert!(check_response_code(&json!({"code": 200})).is_ok());
        assert!(check_response_code(&json!({"code": 201})).is_ok());
        assert!(check_response_code(&json!({"data": {}})).is_ok());
        assert!(check_response_code(&json!({"code": null})).is_ok());
        assert_eq!(
            check_response_code(&json!({"code": 429, "msg": "insufficient credits"})),
            Err(SongError::Submission("insufficient credits".to_string()))
        );
    }

    #[test]
    fn test_title_kept_when_short() {
        assert_eq!(shorten_title("  Techno:   night   drive ", 80), "Techno: night drive");
    }

    #[test]
    fn test_title_shortened_at_word_boundary() {
        let source = format!("Techno: {}", "endless highway ".repeat(10));
        let title = shorten_title(&source, 80);
        assert!(title.chars().count() <= 80);
        assert!(title.ends_with('…'));
        assert!(title.starts_with("Techno: endless highway"));
        let without = title.trim_end_matches('…');
        assert!(source.contains(without));
        assert!(!without.ends_with(' '));
    }

    #[test]
    fn test_title_single_long_word_cut_hard() {
        let title = shorten_title(&"x".repeat(200), 80);
        assert_eq!(title.chars().count(), 80);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn test_submission_clamps_fields() {
        let config = SongApiConfig::default();
        let lyrics = "l".repeat(6000);
        let style = "s".repeat(1500);
        let submission = SongSubmission::new(&lyrics, &style, true, "Trap: song", "Trap", &config);

        assert_eq!(submission.prompt.chars().count(), 5000);
        assert_eq!(submission.style.chars().count(), 1000);
        assert_eq!(submission.title, "Trap: song");
        assert_eq!(submission.model, "V4_5");
        assert!(submission.custom_mode);
    }

    #[test]
    fn test_submission_title_fallback() {
        let config = SongApiConfig::default();
        let submission = SongSubmission::new("l", "s", false, "   ", "Trap", &config);
        assert_eq!(submission.title, "AI-Generated Trap Song");
    }

    #[test]
    fn test_submission_serializes_wire_names() {
        let submission =
            SongSubmission::new("l", "s", false, "t", "g", &SongApiConfig::default());
        let body = serde_json::to_value(&submission).unwrap();
        assert_eq!(body["customMode"], true);
        assert_eq!(body["callBackUrl"], "https://webhook.site/placeholder");
        assert_eq!(body["prompt"], "l");
        assert_eq!(body["model"], "V4_5");
    }

    #[test]
    fn test_status_parsing_with_tracks() {
        let response = json!({
            "code": 200,
            "data": {
                "status": "SUCCESS",
                "response": {"sunoData": [
                    {"audio_url": "https://cdn/a.mp3", "title": "A", "duration": 201.3, "model_name": "chirp-v4-5"},
                    {"audioUrl": "https://cdn/b.mp3"}
                ]}
            }
        });
        let snapshot = parse_status_response(&response).unwrap();
        assert_eq!(snapshot.status, "SUCCESS");
        assert_eq!(snapshot.tracks.len(), 2);
        assert_eq!(snapshot.tracks[0].audio_url.as_deref(), Some("https://cdn/a.mp3"));
        assert_eq!(snapshot.tracks[0].duration_seconds, Some(201.3));
        assert_eq!(snapshot.tracks[1].audio_url.as_deref(), Some("https://cdn/b.mp3"));
    }

    #[test]
    fn test_status_parsing_tolerates_missing_fields() {
        let snapshot = parse_status_response(&json!({"data": {"status": null}})).unwrap();
        assert_eq!(snapshot.status, "");
        assert!(snapshot.tracks.is_empty());
        assert!(parse_status_response(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_credits_parsing() {
        assert_eq!(parse_credits_response(&json!({"code": 200, "data": 42})).unwrap(), 42);
        let err = parse_credits_response(&json!({"code": 401, "msg": "bad key"})).unwrap_err();
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn test_credit_levels() {
        assert_eq!(CreditLevel::from_balance(0), CreditLevel::Low);
        assert_eq!(CreditLevel::from_balance(9), CreditLevel::Low);
        assert_eq!(CreditLevel::from_balance(10), CreditLevel::RunningLow);
        assert_eq!(CreditLevel::from_balance(49), CreditLevel::RunningLow);
        assert_eq!(CreditLevel::from_balance(50), CreditLevel::Sufficient);
    }
}
