//! Lyrics produced by the text-generation step

use serde::Serialize;

/// Outcome of one lyrics generation; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LyricsResult {
    raw_text: String,
    cleaned_text: String,
    style_text_used: String,
}

impl LyricsResult {
    pub fn new(raw_text: String, cleaned_text: String, style_text_used: String) -> Self {
        Self {
            raw_text,
            cleaned_text,
            style_text_used,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn cleaned_text(&self) -> &str {
        &self.cleaned_text
    }

    pub fn style_text_used(&self) -> &str {
        &self.style_text_used
    }

    /// Empty cleaned text means generation failed
    pub fn is_empty(&self) -> bool {
        self.cleaned_text.is_empty()
    }
}
