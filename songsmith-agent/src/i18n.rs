//! Translation tables for UI labels, progress phases and error messages
//!
//! Lookup order: requested language → English → the key itself.

use songsmith_common::{Error, Language, Result};
use std::collections::{BTreeMap, HashMap};

const TRANSLATIONS_TOML: &str = include_str!("../assets/translations.toml");

/// Bilingual key → text tables
#[derive(Debug, Clone)]
pub struct Translator {
    tables: HashMap<Language, HashMap<String, String>>,
}

impl Translator {
    /// Parse the tables embedded in the binary
    pub fn load_builtin() -> Result<Self> {
        Self::from_toml(TRANSLATIONS_TOML)
    }

    /// Parse a document of `[<language code>]` tables
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, String>> = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid translation table: {}", e)))?;

        let mut tables = HashMap::new();
        for (code, table) in raw {
            let language: Language = code.parse()?;
            tables.insert(language, table);
        }

        if !tables.contains_key(&Language::En) {
            return Err(Error::Config(
                "Translation table is missing the [en] section".to_string(),
            ));
        }

        Ok(Self { tables })
    }

    /// Look up `key` in `language`
    pub fn text(&self, language: Language, key: &str) -> String {
        self.lookup(language, key)
            .or_else(|| self.lookup(Language::En, key))
            .unwrap_or(key)
            .to_string()
    }

    /// Look up `key` and substitute `{name}` placeholders
    ///
    /// Placeholders without a matching argument are left in place.
    pub fn format(&self, language: Language, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.text(language, key);
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    /// Full table for one language, English entries filling any gaps
    ///
    /// Embedded into the page so the browser script can localize itself.
    pub fn table(&self, language: Language) -> BTreeMap<&str, &str> {
        let mut merged = BTreeMap::new();
        for lang in [Language::En, language] {
            if let Some(table) = self.tables.get(&lang) {
                merged.extend(table.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
        }
        merged
    }

    fn lookup(&self, language: Language, key: &str) -> Option<&str> {
        self.tables
            .get(&language)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}
