//! Core data models for Book Assist.
//!
//! These types flow through the whole pipeline:
//!
//! ```text
//! CorpusEntry ──search──▶ SearchResult
//!      │
//!      └──translate──▶ TranslatedCorpus ──persist──▶ KvStore
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One section of the book, as bundled with the application.
///
/// Entries are immutable after load and owned by the [`Corpus`](crate::corpus::Corpus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Stable, unique identifier (the section's file name).
    pub id: String,
    /// Section title.
    pub title: String,
    /// Section body text.
    pub body: String,
}

/// A ranked match produced by [`search`](crate::search::search).
///
/// Recomputed for every query; carries no identity across queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Id of the matching [`CorpusEntry`].
    pub source_id: String,
    /// Title of the matching entry.
    pub title: String,
    /// Leading excerpt of the entry body.
    pub excerpt: String,
    /// Distinct query tokens found over all query tokens, in `[0.0, 1.0]`.
    pub score: f64,
}

/// User-facing languages.
///
/// `En` is the language the book is written in; every other language is a
/// translation target served by a lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ur,
}

impl Language {
    /// All languages the assistant knows about.
    pub const ALL: [Language; 2] = [Language::En, Language::Ur];

    /// Two-letter language code (`"en"`, `"ur"`).
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ur => "ur",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ur => "Urdu",
        }
    }

    /// True for the language the corpus is written in.
    pub fn is_source(self) -> bool {
        self == Language::En
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ur" => Ok(Language::Ur),
            _ => Err(CoreError::UnsupportedLanguage(s.trim().to_string())),
        }
    }
}

/// Translated title and body of one corpus entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedSection {
    pub title: String,
    pub body: String,
}

/// The whole book rendered into a target language.
///
/// Keyed identically to the source corpus. Produced as a complete value and
/// persisted as one blob; never updated section by section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedCorpus {
    /// Target language.
    pub language: Language,
    /// Translated sections keyed by [`CorpusEntry::id`].
    pub sections: BTreeMap<String, TranslatedSection>,
}

impl TranslatedCorpus {
    /// Number of translated sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TranslatedSection> {
        self.sections.get(id)
    }

    /// Serialize to the JSON blob stored under
    /// [`translation_key`](crate::store::translation_key).
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}
