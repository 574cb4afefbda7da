//! The offline answering path.
//!
//! [`LocalAssistant`] answers every operation from the bundled corpus: search
//! and questions go through the lexical engine, whole-book translation through
//! the lexicon registry, and translated books are persisted via [`KvStore`].
//!
//! Answers are composed as `"Found in <title>: <excerpt>"` from the best
//! match. When the request language has a lexicon, the answer text is passed
//! through it.

use std::sync::Arc;

use async_trait::async_trait;
use book_assist_core::corpus::Corpus;
use book_assist_core::models::{Language, TranslatedCorpus};
use book_assist_core::search::{search, SearchOutcome};
use book_assist_core::store::{translation_key, KvStore};
use book_assist_core::translate::LexiconRegistry;
use tracing::{debug, warn};

use crate::error::AssistError;
use crate::models::{Answer, SearchReply, TranslationReport};
use crate::traits::Backend;

/// Answer text when nothing in the book matches.
pub const NO_CONTENT: &str = "No content found in the book for your query.";

pub struct LocalAssistant {
    corpus: Corpus,
    lexicons: LexiconRegistry,
    store: Arc<dyn KvStore>,
    max_sources: usize,
}

impl std::fmt::Debug for LocalAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAssistant")
            .field("entries", &self.corpus.len())
            .field("languages", &self.lexicons.languages())
            .field("max_sources", &self.max_sources)
            .finish()
    }
}

impl LocalAssistant {
    pub fn new(
        corpus: Corpus,
        lexicons: LexiconRegistry,
        store: Arc<dyn KvStore>,
        max_sources: usize,
    ) -> Self {
        Self {
            corpus,
            lexicons,
            store,
            max_sources: max_sources.max(1),
        }
    }

    /// Bundled corpus and lexicons over `store`.
    pub fn bundled(store: Arc<dyn KvStore>, max_sources: usize) -> Result<Self, AssistError> {
        Ok(Self::new(
            Corpus::bundled()?,
            LexiconRegistry::bundled()?,
            store,
            max_sources,
        ))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn lexicons(&self) -> &LexiconRegistry {
        &self.lexicons
    }

    /// Read back a previously persisted translation of the book.
    pub async fn load_translation(
        &self,
        language: Language,
    ) -> Result<Option<TranslatedCorpus>, AssistError> {
        let stored = self
            .store
            .get(&translation_key(language))
            .await
            .map_err(|e| AssistError::Storage(format!("{:#}", e)))?;

        match stored {
            Some(json) => Ok(Some(TranslatedCorpus::from_json(&json)?)),
            None => Ok(None),
        }
    }

    fn compose(&self, outcome: &SearchOutcome) -> Answer {
        match outcome.best() {
            Some(best) => Answer {
                text: format!("Found in {}: {}", best.title, best.excerpt),
                sources: outcome
                    .results()
                    .iter()
                    .take(self.max_sources)
                    .map(|r| r.source_id.clone())
                    .collect(),
                confidence: Some(best.score),
                explanation: None,
            },
            None => Answer {
                text: NO_CONTENT.to_string(),
                sources: Vec::new(),
                confidence: Some(0.0),
                explanation: None,
            },
        }
    }

    /// Pass `text` through the lexicon for `language`, if there is one.
    fn localize(&self, text: String, language: Language) -> String {
        match self.lexicons.get(language) {
            Ok(translator) => translator.translate(&text),
            Err(_) => text,
        }
    }
}

#[async_trait]
impl Backend for LocalAssistant {
    fn name(&self) -> &str {
        "local"
    }

    fn supports_translation(&self, language: Language) -> bool {
        self.lexicons.supports(language)
    }

    async fn search(&self, query: &str, _language: Language) -> Result<SearchReply, AssistError> {
        let outcome = search(query, &self.corpus);
        debug!(matches = outcome.results().len(), "local search");
        Ok(SearchReply::Lexical(outcome))
    }

    async fn ask(&self, question: &str, language: Language) -> Result<Answer, AssistError> {
        let mut answer = self.compose(&search(question, &self.corpus));
        answer.text = self.localize(answer.text, language);
        Ok(answer)
    }

    async fn ask_selection(
        &self,
        selected_text: &str,
        _question: &str,
        language: Language,
    ) -> Result<Answer, AssistError> {
        let mut answer = self.compose(&search(selected_text, &self.corpus));
        answer.text = self.localize(answer.text, language);
        answer.explanation = Some(format!(
            "This explanation is based on the book content and provides context for the selected text: '{}'",
            selected_text
        ));
        Ok(answer)
    }

    async fn translate_book(&self, language: Language) -> Result<TranslationReport, AssistError> {
        let translated = self.lexicons.translate_corpus(&self.corpus, language)?;
        let sections = translated.len();
        let json = translated.to_json()?;

        let storage_warning = match self.store.set(&translation_key(language), &json).await {
            Ok(()) => None,
            Err(e) => {
                warn!(language = %language, error = %e, "failed to persist translated book");
                Some(format!("The translation could not be saved: {:#}", e))
            }
        };

        Ok(TranslationReport {
            language,
            message: format!(
                "Book translated to {} successfully. {} sections translated.",
                language.code().to_uppercase(),
                sections
            ),
            url: Some(format!("/docs/{}", language.code())),
            sections: Some(sections),
            storage_warning,
        })
    }
}
