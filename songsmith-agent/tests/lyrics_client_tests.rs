//! Lyrics generation tests against an in-process mock Ollama server

mod helpers;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use helpers::spawn_mock_server;
use serde_json::{json, Value};
use songsmith_agent::catalog::StyleCatalog;
use songsmith_agent::services::{generate_lyrics, OllamaClient, TextGenerationError, TextGenerator};
use songsmith_agent::SongError;
use songsmith_common::config::TextGenerationConfig;
use songsmith_common::Language;
use std::sync::{Arc, Mutex};

type Requests = Arc<Mutex<Vec<Value>>>;

async fn mock_ollama(reply: &'static str) -> (String, Requests) {
    let requests: Requests = Arc::default();

    let router = Router::new()
        .route(
            "/api/generate",
            post(
                move |State(requests): State<Requests>, Json(body): Json<Value>| async move {
                    requests.lock().unwrap().push(body);
                    Json(json!({"model": "gemma3n:e4b", "response": reply, "done": true}))
                },
            ),
        )
        .with_state(requests.clone());

    (spawn_mock_server(router).await, requests)
}

fn client_for(base_url: &str) -> OllamaClient {
    OllamaClient::new(&TextGenerationConfig {
        base_url: format!("{}/", base_url),
        ..TextGenerationConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_request_shape_and_response_field() {
    let (base_url, requests) = mock_ollama("[Verse 1]\nhello").await;
    let client = client_for(&base_url);

    let text = client.generate("write a song").await.unwrap();

    assert_eq!(text, "[Verse 1]\nhello");
    let body = requests.lock().unwrap()[0].clone();
    assert_eq!(body["model"], json!("gemma3n:e4b"));
    assert_eq!(body["prompt"], json!("write a song"));
    assert_eq!(body["stream"], json!(false));
    assert_eq!(body["options"]["temperature"], json!(0.8));
    assert_eq!(body["options"]["top_p"], json!(0.9));
    assert_eq!(body["options"]["max_tokens"], json!(2000));
}

#[tokio::test]
async fn test_http_error_status() {
    let router = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::NOT_FOUND, "model not found") }),
    );
    let base_url = spawn_mock_server(router).await;
    let client = client_for(&base_url);

    let result = client.generate("prompt").await;

    match result {
        Err(TextGenerationError::HttpError(status, body)) => {
            assert_eq!(status, 404);
            assert_eq!(body, "model not found");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_lyrics_cleans_preamble() {
    let (base_url, requests) =
        mock_ollama("Here is your song:\n\n[Intro]\nSoft lights\n\n[Chorus]\nHold on\n").await;
    let client = client_for(&base_url);
    let catalog = StyleCatalog::load_builtin().unwrap();
    let style = catalog.style_text("Jazz", None, Language::En);

    let lyrics = generate_lyrics(
        &client,
        &catalog,
        "an old piano bar",
        "Jazz",
        &style,
        Language::En,
    )
    .await
    .unwrap();

    assert_eq!(lyrics.cleaned_text(), "[Intro]\nSoft lights\n\n[Chorus]\nHold on");
    assert!(lyrics.raw_text().starts_with("Here is your song"));
    assert_eq!(lyrics.style_text_used(), style);

    let prompt = requests.lock().unwrap()[0]["prompt"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains("an old piano bar"));
    assert!(prompt.contains("GENRE CONTEXT (Jazz)"));
}

#[tokio::test]
async fn test_generate_lyrics_german_prompt() {
    let (base_url, requests) = mock_ollama("[Verse 1]\nRegen auf der Straße").await;
    let client = client_for(&base_url);
    let catalog = StyleCatalog::load_builtin().unwrap();
    let style = catalog.style_text("Techno", None, Language::De);

    generate_lyrics(&client, &catalog, "Nachtfahrt", "Techno", &style, Language::De)
        .await
        .unwrap();

    let prompt = requests.lock().unwrap()[0]["prompt"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.starts_with("Du bist ein professioneller Songwriter"));
    assert!(prompt.contains("GENRE-KONTEXT (Techno)"));
}

#[tokio::test]
async fn test_whitespace_only_output_fails() {
    let (base_url, _) = mock_ollama("   \n\n  ").await;
    let client = client_for(&base_url);
    let catalog = StyleCatalog::load_builtin().unwrap();

    let result = generate_lyrics(
        &client,
        &catalog,
        "anything",
        "Techno",
        "Genre: Techno",
        Language::En,
    )
    .await;

    assert!(matches!(result, Err(SongError::LyricsGenerationFailed(_))));
}
