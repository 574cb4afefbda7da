//! The immutable book corpus.
//!
//! The bundled data set is embedded at compile time and parsed once at
//! startup. Loading validates the data and fails fast: an application that
//! cannot load its corpus has nothing to search or translate.

use std::collections::HashSet;

use crate::error::{CoreError, Result};
use crate::models::CorpusEntry;

const BUNDLED_CORPUS: &str = include_str!("../data/corpus.json");

/// Ordered, read-only collection of [`CorpusEntry`] values.
///
/// There is no mutation API. Translation produces a separate
/// [`TranslatedCorpus`](crate::models::TranslatedCorpus) so the source text
/// stays available for re-translation and language switching.
#[derive(Debug, Clone)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Load the corpus bundled with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CORPUS)
    }

    /// Parse a JSON array of `{id, title, body}` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CorpusEntry> = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidCorpus(format!("malformed corpus JSON: {}", e)))?;
        Self::from_entries(entries)
    }

    /// Build a corpus from entries, keeping their order.
    ///
    /// # Errors
    ///
    /// Fails if there are no entries, an id is blank, or an id repeats.
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(CoreError::InvalidCorpus("corpus has no entries".to_string()));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(CoreError::InvalidCorpus(format!(
                    "entry with title '{}' has an empty id",
                    entry.title
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(CoreError::InvalidCorpus(format!(
                    "duplicate entry id: {}",
                    entry.id
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CorpusEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
