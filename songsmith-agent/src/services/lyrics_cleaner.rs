//! Cleanup of raw text-generation output into plain lyrics
//!
//! Models tend to open with an introductory sentence ("Here is a song about...:")
//! despite being told not to. The ordered preamble pattern list is stripped
//! from the whole text first, then everything before the earliest section
//! marker is dropped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum lyrics length accepted by the song-generation service
pub const MAX_LYRICS_CHARS: usize = 5000;

/// Introductory phrases removed anywhere in the output, in order
pub const PREAMBLE_PATTERNS: &[&str] = &[
    r"Okay,?\s*hier ist ein.*?:",
    r"Hier ist ein.*?:",
    r"Ich habe.*?erstellt:",
    r"Der folgende.*?:",
    r"Basierend auf.*?:",
    r"Hier sind die.*?:",
    r".*?im\s+\w+\s+Stil.*?:",
    r".*?passend zu.*?:",
    r".*?entsprechend.*?:",
    r"Sure[,!.]?.*?:",
    r"Okay,?\s*here(?:'s| is).*?:",
    r"Here(?:'s| is| are).*?:",
    r"I(?:'ve| have) (?:written|created).*?:",
    r"Based on.*?:",
    r".*?in the style of.*?:",
    r".*?Genre.*?:",
    r".*?Songtext.*?:",
    r".*?Lyrics.*?:",
    r".*?Text.*?:",
];

static SECTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[(?:verse|pre-chorus|chorus|bridge|intro|outro)")
        .expect("section marker pattern is valid")
});

static PREAMBLES: Lazy<Vec<Regex>> = Lazy::new(|| {
    PREAMBLE_PATTERNS
        .iter()
        .map(|p| Regex::new(&format!("(?im){}", p)).expect("preamble pattern is valid"))
        .collect()
});

/// Turn raw model output into lyrics
///
/// Result is trimmed and at most [`MAX_LYRICS_CHARS`] characters. An empty
/// result means the output held no usable lyrics.
pub fn clean_lyrics(raw: &str) -> String {
    let stripped = strip_preambles(raw.trim());
    let text = stripped.trim();

    let cleaned = match SECTION_MARKER.find(text) {
        Some(marker) => &text[marker.start()..],
        None => text,
    };

    truncate_chars(cleaned.trim(), MAX_LYRICS_CHARS).to_string()
}

fn strip_preambles(text: &str) -> String {
    PREAMBLES
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}

/// Cut `text` to at most `max_chars` characters (not bytes)
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
