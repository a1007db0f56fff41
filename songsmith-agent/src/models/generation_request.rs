//! Validated song request

use serde::Serialize;

use crate::catalog::CUSTOM_GENRE;
use crate::error::{RequestProblem, SongError};

/// Genre chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum GenreSelection {
    /// A named catalog entry (unknown names fall back to a generic style)
    Catalog(String),
    /// User-defined style text
    Custom,
}

impl GenreSelection {
    /// Map a submitted genre name to a selection
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name == CUSTOM_GENRE {
            GenreSelection::Custom
        } else {
            GenreSelection::Catalog(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GenreSelection::Catalog(name) => name,
            GenreSelection::Custom => CUSTOM_GENRE,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, GenreSelection::Custom)
    }
}

/// A song request; immutable once constructed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    description: String,
    genre: GenreSelection,
    custom_style_text: Option<String>,
    instrumental_only: bool,
}

impl GenerationRequest {
    /// Validate and build a request
    ///
    /// The description must be non-blank; the custom genre additionally needs
    /// non-blank style text. Both are stored trimmed.
    pub fn new(
        description: &str,
        genre: GenreSelection,
        custom_style_text: Option<&str>,
        instrumental_only: bool,
    ) -> Result<Self, SongError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(SongError::InvalidRequest(RequestProblem::MissingDescription));
        }

        let custom_style_text = custom_style_text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        if genre.is_custom() && custom_style_text.is_none() {
            return Err(SongError::InvalidRequest(RequestProblem::MissingCustomStyle));
        }

        Ok(Self {
            description: description.to_string(),
            genre,
            custom_style_text,
            instrumental_only,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn genre(&self) -> &GenreSelection {
        &self.genre
    }

    pub fn genre_name(&self) -> &str {
        self.genre.name()
    }

    pub fn custom_style_text(&self) -> Option<&str> {
        self.custom_style_text.as_deref()
    }

    pub fn instrumental_only(&self) -> bool {
        self.instrumental_only
    }

    /// Raw title before shortening: "{genre}: {description}"
    pub fn title_source(&self) -> String {
        format!("{}: {}", self.genre_name(), self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_description_rejected() {
        let result = GenerationRequest::new("   ", GenreSelection::from_name("Techno"), None, false);
        assert_eq!(
            result,
            Err(SongError::InvalidRequest(RequestProblem::MissingDescription))
        );
    }

    #[test]
    fn test_custom_genre_requires_style_text() {
        let result = GenerationRequest::new("a song", GenreSelection::Custom, Some("  "), false);
        assert_eq!(
            result,
            Err(SongError::InvalidRequest(RequestProblem::MissingCustomStyle))
        );

        let ok = GenerationRequest::new("a song", GenreSelection::Custom, Some(" dub "), true)
            .unwrap();
        assert_eq!(ok.custom_style_text(), Some("dub"));
        assert!(ok.instrumental_only());
    }

    #[test]
    fn test_from_name_recognizes_custom() {
        assert_eq!(GenreSelection::from_name("Custom"), GenreSelection::Custom);
        assert_eq!(
            GenreSelection::from_name(" Techno "),
            GenreSelection::Catalog("Techno".to_string())
        );
    }

    #[test]
    fn test_title_source_joins_genre_and_description() {
        let request =
            GenerationRequest::new(" rainy night ", GenreSelection::from_name("Lo-Fi"), None, false)
                .unwrap();
        assert_eq!(request.title_source(), "Lo-Fi: rainy night");
    }
}
