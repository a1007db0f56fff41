//! Completed song files offered for download

use chrono::{DateTime, Local};
use serde::Serialize;

use super::TrackMetadata;

/// Audio file plus lyrics sheet of a finished song
#[derive(Debug, Clone, Serialize)]
pub struct DownloadableArtifact {
    #[serde(skip)]
    pub audio_bytes: Vec<u8>,
    pub audio_filename: String,
    pub lyrics_text: String,
    pub lyrics_filename: String,
    pub metadata: TrackMetadata,
    pub genre: String,
    pub audio_url: String,
    pub created_at: DateTime<Local>,
}

impl DownloadableArtifact {
    /// Assemble the artifact and render the lyrics sheet
    ///
    /// `default_model` fills in the model line when the provider did not
    /// report one.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        genre: &str,
        style_text: &str,
        lyrics: &str,
        metadata: TrackMetadata,
        default_model: &str,
        audio_url: String,
        audio_bytes: Vec<u8>,
        created_at: DateTime<Local>,
    ) -> Self {
        let base = artifact_basename(genre, created_at);
        let lyrics_text =
            render_lyrics_sheet(genre, style_text, lyrics, &metadata, default_model, created_at);

        Self {
            audio_bytes,
            audio_filename: format!("{}.mp3", base),
            lyrics_text,
            lyrics_filename: format!("{}_lyrics.txt", base),
            metadata,
            genre: genre.to_string(),
            audio_url,
            created_at,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.audio_bytes.len()
    }
}

/// Lowercased genre safe for a download filename
///
/// Keeps ASCII letters, digits, `-` and `_`; every other character becomes `_`.
pub fn genre_slug(genre: &str) -> String {
    genre
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

/// `ai_{slug}_{YYYYMMDD_HHMM}`
fn artifact_basename(genre: &str, at: DateTime<Local>) -> String {
    format!("ai_{}_{}", genre_slug(genre), at.format("%Y%m%d_%H%M"))
}

fn render_lyrics_sheet(
    genre: &str,
    style_text: &str,
    lyrics: &str,
    metadata: &TrackMetadata,
    default_model: &str,
    at: DateTime<Local>,
) -> String {
    let title = metadata.title.as_deref().unwrap_or("AI Generated Song");
    let duration = metadata
        .duration_seconds
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let model = metadata.model_name.as_deref().unwrap_or(default_model);

    format!(
        "Song Title: {title}\n\
         Genre: {genre}\n\
         Style: {style_text}\n\
         Generated: {generated}\n\
         Duration: {duration} seconds\n\
         Model: {model}\n\
         \n\
         --- LYRICS ---\n\
         \n\
         {lyrics}\n\
         \n\
         --- END ---\n\
         \n\
         Generated by AI Song Agent\n",
        generated = at.format("%Y-%m-%d %H:%M:%S"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 0).unwrap()
    }

    #[test]
    fn test_filenames_use_slug_and_timestamp() {
        let artifact = DownloadableArtifact::new(
            "Deep House",
            "style",
            "[Verse 1]\nla",
            TrackMetadata::default(),
            "V4_5",
            "https://cdn/a.mp3".to_string(),
            vec![1, 2, 3],
            at(),
        );

        assert_eq!(artifact.audio_filename, "ai_deep_house_20250307_0905.mp3");
        assert_eq!(artifact.lyrics_filename, "ai_deep_house_20250307_0905_lyrics.txt");
        assert_eq!(artifact.size_bytes(), 3);
    }

    #[test]
    fn test_genre_slug_is_filename_safe() {
        assert_eq!(genre_slug("Deep House"), "deep_house");
        assert_eq!(genre_slug("R&B"), "r_b");
        assert_eq!(genre_slug("Lo-Fi Hip_Hop"), "lo-fi_hip_hop");
        assert_eq!(genre_slug("Neo\nSoul"), "neo_soul");
        assert_eq!(genre_slug("say \"hi\"\r"), "say__hi_");
        assert_eq!(genre_slug("Kölsch Rock"), "k_lsch_rock");
    }

    #[test]
    fn test_lyrics_sheet_layout() {
        let metadata = TrackMetadata {
            title: Some("Night Drive".to_string()),
            duration_seconds: Some(187.5),
            model_name: None,
        };
        let artifact = DownloadableArtifact::new(
            "Synthpop",
            "Genre: Synthpop",
            "[Verse 1]\nNeon lights",
            metadata,
            "V4_5",
            "https://cdn/a.mp3".to_string(),
            Vec::new(),
            at(),
        );

        let expected = "Song Title: Night Drive\n\
                        Genre: Synthpop\n\
                        Style: Genre: Synthpop\n\
                        Generated: 2025-03-07 09:05:00\n\
                        Duration: 187.5 seconds\n\
                        Model: V4_5\n\
                        \n\
                        --- LYRICS ---\n\
                        \n\
                        [Verse 1]\nNeon lights\n\
                        \n\
                        --- END ---\n\
                        \n\
                        Generated by AI Song Agent\n";
        assert_eq!(artifact.lyrics_text, expected);
    }

    #[test]
    fn test_missing_metadata_placeholders() {
        let text = render_lyrics_sheet("Trap", "s", "l", &TrackMetadata::default(), "V4_5", at());
        assert!(text.starts_with("Song Title: AI Generated Song\n"));
        assert!(text.contains("Duration: N/A seconds\n"));
    }
}
