//! Root page handler - song creation page

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use songsmith_common::Language;

use crate::catalog::CUSTOM_GENRE;
use crate::AppState;

/// GET /
///
/// Genre picker, live style preview, song form, progress and downloads.
/// Labels are rendered in the operating language; messages that depend on
/// pipeline events are looked up client-side from `/api/translations`.
pub async fn root_page(State(state): State<AppState>) -> impl IntoResponse {
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_profile = env!("BUILD_PROFILE");

    let language = state.current_language().await;
    let t = |key: &str| escape_html(&state.translator.text(language, key));

    let language_options: String = Language::ALL
        .iter()
        .map(|l| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                l.code(),
                if *l == language { " selected" } else { "" },
                l.display_name()
            )
        })
        .collect();

    let genre_options: String = state
        .catalog
        .genre_names()
        .into_iter()
        .map(|name| {
            let name = escape_html(name);
            format!(r#"<option value="{}">{}</option>"#, name, name)
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{app_title}</title>
    <link rel="stylesheet" href="/static/songsmith-ui.css">
    <style>
        /* Page-specific styles - shared styles in songsmith-ui.css */
        .layout {{
            display: grid;
            grid-template-columns: 280px 1fr;
            gap: 24px;
        }}
        .preview-grid {{
            display: grid;
            grid-template-columns: 1fr 1fr;
            gap: 12px;
        }}
        @media (max-width: 800px) {{
            .layout {{ grid-template-columns: 1fr; }}
        }}
    </style>
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>
                    {app_title}
                    <span class="connection-status status-connecting" id="connection-status">…</span>
                </h1>
                <p class="subtitle">{app_subtitle}</p>
            </div>
            <div class="header-right">
                <div class="build-info-line">songsmith-agent v{version}</div>
                <div class="build-info-line">{git_hash} ({build_profile})</div>
                <div class="build-info-line">{build_timestamp}</div>
            </div>
        </div>
    </header>
    <div class="container layout">
        <aside class="panel">
            <label for="language-select">{language_label}</label>
            <select id="language-select">{language_options}</select>

            <h2>{how_it_works}</h2>
            <p>{how_it_works_desc}</p>
            <ul>
                <li>{feature_lyrics}</li>
                <li>{feature_style}</li>
                <li>{feature_audio}</li>
                <li>{feature_preview}</li>
            </ul>

            <h2>{credits_status}</h2>
            <div id="credits-box" class="notice">…</div>
            <button type="button" class="button secondary" id="refresh-credits">{refresh_credits}</button>
            <p class="muted">{api_provider}</p>
        </aside>

        <main>
            <section class="panel">
                <h2>{genre_selection}</h2>
                <label for="genre-select">{choose_genre}</label>
                <select id="genre-select">{genre_options}</select>

                <h3>{live_style_preview}</h3>
                <div class="preview-grid" id="style-preview">
                    <div><strong>{tempo_label}</strong> <span id="preview-tempo"></span></div>
                    <div><strong>{mood_label}</strong> <span id="preview-mood"></span></div>
                    <div><strong>{instrumentation_label}</strong> <span id="preview-instrumentation"></span></div>
                    <div><strong>{vocals_label}</strong> <span id="preview-vocals"></span></div>
                    <div><strong>{examples_label}</strong> <span id="preview-examples"></span></div>
                </div>
            </section>

            <section class="panel">
                <h2>{song_config}</h2>
                <p><strong>{selected_genre}</strong> <span id="selected-genre"></span></p>
                <label class="checkbox"><input type="checkbox" id="instrumental"> {instrumental_only}</label>

                <div id="custom-style-block" hidden>
                    <label for="custom-style">{custom_style_desc}</label>
                    <textarea id="custom-style" rows="3" placeholder="{custom_style_placeholder}"></textarea>
                </div>

                <label for="description">{song_description}</label>
                <textarea id="description" rows="4" placeholder="{song_desc_placeholder}"></textarea>

                <details>
                    <summary>{generated_style}</summary>
                    <pre id="style-text"></pre>
                </details>

                <div class="actions">
                    <button type="button" class="button" id="create-song">{create_song}</button>
                    <button type="button" class="button secondary" id="cancel-song" hidden>{cancel_song}</button>
                    <button type="button" class="button secondary" id="clear-song" hidden>{clear_song}</button>
                </div>
            </section>

            <section class="panel" id="progress-panel" hidden>
                <div id="status-message" class="notice"></div>
                <div class="progress"><div class="progress-bar" id="progress-bar"></div></div>
                <p class="muted" id="progress-detail"></p>
                <details id="lyrics-block" hidden>
                    <summary>{show_lyrics}</summary>
                    <pre id="lyrics-text"></pre>
                </details>
            </section>

            <section class="panel" id="result-panel" hidden>
                <h2 id="result-heading"></h2>
                <div class="metrics">
                    <div class="metric"><span class="muted">{title_metric}</span><strong id="metric-title"></strong></div>
                    <div class="metric"><span class="muted">{genre_metric}</span><strong id="metric-genre"></strong></div>
                    <div class="metric"><span class="muted">{duration_metric}</span><strong id="metric-duration"></strong></div>
                    <div class="metric"><span class="muted">{model_metric}</span><strong id="metric-model"></strong></div>
                </div>
                <audio id="audio-player" controls preload="none"></audio>
                <div class="actions">
                    <a class="button" id="download-audio" href="/api/song/audio"></a>
                    <a class="button secondary" id="download-lyrics" href="/api/song/lyrics"></a>
                </div>
                <p class="muted">{download_tip}</p>
            </section>
        </main>
    </div>
    <script>window.SONGSMITH_CUSTOM_GENRE = "{custom_genre}";</script>
    <script src="/static/song-agent.js"></script>
</body>
</html>"#,
        lang = language.code(),
        app_title = t("app_title"),
        app_subtitle = t("app_subtitle"),
        version = version,
        git_hash = git_hash,
        build_profile = build_profile,
        build_timestamp = build_timestamp,
        language_label = t("language_label"),
        language_options = language_options,
        how_it_works = t("how_it_works"),
        how_it_works_desc = t("how_it_works_desc"),
        feature_lyrics = t("feature_lyrics"),
        feature_style = t("feature_style"),
        feature_audio = t("feature_audio"),
        feature_preview = t("feature_preview"),
        credits_status = t("credits_status"),
        refresh_credits = t("refresh_credits"),
        api_provider = t("api_provider"),
        genre_selection = t("genre_selection"),
        choose_genre = t("choose_genre"),
        genre_options = genre_options,
        live_style_preview = t("live_style_preview"),
        tempo_label = t("tempo_label"),
        mood_label = t("mood_label"),
        instrumentation_label = t("instrumentation_label"),
        vocals_label = t("vocals_label"),
        examples_label = t("examples_label"),
        song_config = t("song_config"),
        selected_genre = t("selected_genre"),
        instrumental_only = t("instrumental_only"),
        custom_style_desc = t("custom_style_desc"),
        custom_style_placeholder = t("custom_style_placeholder"),
        song_description = t("song_description"),
        song_desc_placeholder = t("song_desc_placeholder"),
        generated_style = t("generated_style"),
        create_song = t("create_song"),
        cancel_song = t("cancel_song"),
        clear_song = t("clear_song"),
        show_lyrics = t("show_lyrics"),
        title_metric = t("title_metric"),
        genre_metric = t("genre_metric"),
        duration_metric = t("duration_metric"),
        model_metric = t("model_metric"),
        download_tip = t("download_tip"),
        custom_genre = CUSTOM_GENRE,
    );

    Html(html)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">R&B</a>"#),
            "&lt;a href=&quot;x&quot;&gt;R&amp;B&lt;/a&gt;"
        );
    }
}
