//! Built-in genre style catalog
//!
//! The catalog is an embedded TOML asset with one bilingual entry per genre.
//! It is parsed once at startup and shared read-only through [`crate::AppState`].

use serde::{Deserialize, Serialize};
use songsmith_common::{Error, Language, Result};

const GENRE_STYLES_TOML: &str = include_str!("../assets/genre_styles.toml");

/// Name of the user-defined genre entry
pub const CUSTOM_GENRE: &str = "Custom";

/// Text stored in both supported languages
#[derive(Debug, Clone, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub de: String,
}

impl LocalizedText {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::De => &self.de,
        }
    }
}

/// One catalog entry as stored in the asset
#[derive(Debug, Clone, Deserialize)]
pub struct GenreEntry {
    pub name: String,
    pub tempo: String,
    pub instrumentation: LocalizedText,
    pub vocals: LocalizedText,
    pub mood: LocalizedText,
    pub description: LocalizedText,
    pub examples: LocalizedText,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    genre: Vec<GenreEntry>,
}

/// Catalog entry resolved for one language
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDescriptor {
    pub genre_name: String,
    pub tempo_range: String,
    pub instrumentation: String,
    pub vocals: String,
    pub mood: String,
    pub description: String,
    pub examples: String,
}

impl StyleDescriptor {
    /// Compact style line sent to both generation services
    pub fn style_text(&self) -> String {
        format!(
            "Genre: {}, Tempo: {}, Instrumentation: {}, Vocals: {}, Mood: {}",
            self.genre_name, self.tempo_range, self.instrumentation, self.vocals, self.mood
        )
    }
}

/// Static genre → style mapping
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    entries: Vec<GenreEntry>,
}

impl StyleCatalog {
    /// Parse the catalog embedded in the binary
    pub fn load_builtin() -> Result<Self> {
        Self::from_toml(GENRE_STYLES_TOML)
    }

    /// Parse a catalog document
    ///
    /// Genre names must be unique.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid genre catalog: {}", e)))?;

        for (i, entry) in file.genre.iter().enumerate() {
            if file.genre[..i].iter().any(|other| other.name == entry.name) {
                return Err(Error::Config(format!(
                    "Duplicate genre in catalog: {}",
                    entry.name
                )));
            }
        }

        Ok(Self { entries: file.genre })
    }

    /// Genre names in catalog order
    pub fn genre_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, genre: &str) -> Option<&GenreEntry> {
        self.entries.iter().find(|e| e.name == genre)
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.get(genre).is_some()
    }

    /// Resolve an entry for one language
    pub fn descriptor(&self, genre: &str, language: Language) -> Option<StyleDescriptor> {
        self.get(genre).map(|entry| StyleDescriptor {
            genre_name: entry.name.clone(),
            tempo_range: entry.tempo.clone(),
            instrumentation: entry.instrumentation.get(language).to_string(),
            vocals: entry.vocals.get(language).to_string(),
            mood: entry.mood.get(language).to_string(),
            description: entry.description.get(language).to_string(),
            examples: entry.examples.get(language).to_string(),
        })
    }

    /// Style text for a genre selection
    ///
    /// The custom genre with non-blank text yields that text unchanged. Any
    /// other known genre yields the synthesized style line. Unknown genres
    /// get a fixed localized fallback.
    pub fn style_text(&self, genre: &str, custom_text: Option<&str>, language: Language) -> String {
        if genre == CUSTOM_GENRE {
            if let Some(text) = custom_text.filter(|t| !t.trim().is_empty()) {
                return text.to_string();
            }
        }

        match self.descriptor(genre, language) {
            Some(descriptor) => descriptor.style_text(),
            None => fallback_style_text(language).to_string(),
        }
    }
}

/// Style used when the genre is not in the catalog
pub fn fallback_style_text(language: Language) -> &'static str {
    match language {
        Language::En => "Emotional ballad with piano and strings",
        Language::De => "Emotionale Ballade mit Piano und Strings",
    }
}
