//! Remote-first routing with local fallback.
//!
//! Every operation runs through the same state machine:
//!
//! ```text
//! Probing ──Reachable──▶ Remote ──ok──▶ Succeeded
//!    │                     │
//!    │                     └─err─▶ Local ──ok──▶ Degraded(RemoteFailed)
//!    │                               └──err──▶ Failed
//!    └──Unreachable──────────────▶ Local ──ok──▶ Degraded(ProbeFailed)
//!                                    └──err──▶ Failed
//! ```
//!
//! Availability is never cached: each public operation probes again and
//! passes the fresh [`Availability`] into its `*_with` variant. The `*_with`
//! variants are public so callers can drive routing without a probe.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use book_assist_core::corpus::Corpus;
use book_assist_core::models::Language;
use book_assist_core::search::SearchOutcome;
use book_assist_core::translate::{CascadePolicy, LexiconRegistry, Translator};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AssistError;
use crate::kv_file::FileStore;
use crate::local::LocalAssistant;
use crate::models::{
    Answer, Availability, DegradeCause, Operation, OperationState, Resolution, Routed,
    SearchReply, TranslationReport,
};
use crate::remote::HttpRemote;
use crate::traits::{Backend, Probe};

type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AssistError>> + Send + 'a>>;

/// The orchestrator wired to the HTTP service and the bundled book.
pub type BookOrchestrator = Orchestrator<HttpRemote, LocalAssistant>;

pub struct Orchestrator<R, L> {
    remote: R,
    local: L,
}

impl<R, L> Orchestrator<R, L>
where
    R: Backend + Probe,
    L: Backend,
{
    pub fn new(remote: R, local: L) -> Self {
        Self { remote, local }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Probe the remote service.
    pub async fn probe(&self) -> Availability {
        let availability = self.remote.probe().await;
        match &availability {
            Availability::Reachable => debug!(backend = self.remote.name(), "probe ok"),
            Availability::Unreachable(reason) => {
                info!(backend = self.remote.name(), reason = %reason, "remote unreachable")
            }
        }
        availability
    }

    pub async fn search(
        &self,
        query: &str,
        language: Language,
    ) -> Result<Routed<SearchReply>, AssistError> {
        if query.trim().is_empty() {
            return Ok(Routed::immediate(SearchReply::Lexical(SearchOutcome::NoQuery)));
        }
        let availability = self.probe().await;
        self.search_with(availability, query, language).await
    }

    pub async fn search_with(
        &self,
        availability: Availability,
        query: &str,
        language: Language,
    ) -> Result<Routed<SearchReply>, AssistError> {
        if query.trim().is_empty() {
            return Ok(Routed::immediate(SearchReply::Lexical(SearchOutcome::NoQuery)));
        }
        self.route(
            Operation::Search,
            availability,
            self.remote.search(query, language),
            self.local.search(query, language),
        )
        .await
    }

    pub async fn ask(
        &self,
        question: &str,
        language: Language,
    ) -> Result<Routed<Answer>, AssistError> {
        if question.trim().is_empty() {
            return Err(AssistError::EmptyInput);
        }
        let availability = self.probe().await;
        self.ask_with(availability, question, language).await
    }

    pub async fn ask_with(
        &self,
        availability: Availability,
        question: &str,
        language: Language,
    ) -> Result<Routed<Answer>, AssistError> {
        if question.trim().is_empty() {
            return Err(AssistError::EmptyInput);
        }
        self.route(
            Operation::Ask,
            availability,
            self.remote.ask(question, language),
            self.local.ask(question, language),
        )
        .await
    }

    pub async fn ask_selection(
        &self,
        selected_text: &str,
        question: &str,
        language: Language,
    ) -> Result<Routed<Answer>, AssistError> {
        if selected_text.trim().is_empty() {
            return Err(AssistError::EmptyInput);
        }
        let availability = self.probe().await;
        self.ask_selection_with(availability, selected_text, question, language)
            .await
    }

    pub async fn ask_selection_with(
        &self,
        availability: Availability,
        selected_text: &str,
        question: &str,
        language: Language,
    ) -> Result<Routed<Answer>, AssistError> {
        if selected_text.trim().is_empty() {
            return Err(AssistError::EmptyInput);
        }
        self.route(
            Operation::AskSelection,
            availability,
            self.remote.ask_selection(selected_text, question, language),
            self.local.ask_selection(selected_text, question, language),
        )
        .await
    }

    /// Translate the whole book.
    ///
    /// A language the local lexicons cannot produce is rejected before the
    /// probe, so it never reaches the network or the store.
    pub async fn translate_book(
        &self,
        language: Language,
    ) -> Result<Routed<TranslationReport>, AssistError> {
        self.check_translatable(language)?;
        let availability = self.probe().await;
        self.translate_book_with(availability, language).await
    }

    pub async fn translate_book_with(
        &self,
        availability: Availability,
        language: Language,
    ) -> Result<Routed<TranslationReport>, AssistError> {
        self.check_translatable(language)?;
        self.route(
            Operation::TranslateBook,
            availability,
            self.remote.translate_book(language),
            self.local.translate_book(language),
        )
        .await
    }

    fn check_translatable(&self, language: Language) -> Result<(), AssistError> {
        if self.local.supports_translation(language) {
            Ok(())
        } else {
            Err(AssistError::UnsupportedLanguage(language.code().to_string()))
        }
    }

    /// Run one operation. Only the branch that is chosen gets polled.
    async fn route<T>(
        &self,
        operation: Operation,
        availability: Availability,
        remote: BackendFuture<'_, T>,
        local: BackendFuture<'_, T>,
    ) -> Result<Routed<T>, AssistError> {
        let op = operation.as_str();
        let mut trace = vec![OperationState::Probing];

        let cause = match availability {
            Availability::Reachable => {
                trace.push(OperationState::Remote);
                match remote.await {
                    Ok(value) => {
                        trace.push(OperationState::Succeeded);
                        debug!(operation = op, "answered by remote service");
                        return Ok(Routed {
                            value,
                            resolution: Resolution::Succeeded,
                            trace,
                        });
                    }
                    Err(err) => {
                        warn!(operation = op, error = %err, "remote call failed, falling back to local");
                        DegradeCause::RemoteFailed(err.to_string())
                    }
                }
            }
            Availability::Unreachable(reason) => {
                debug!(operation = op, "answering offline");
                DegradeCause::ProbeFailed(reason)
            }
        };

        trace.push(OperationState::Local);
        match local.await {
            Ok(value) => {
                trace.push(OperationState::Degraded);
                info!(operation = op, backend = self.local.name(), "answered by local fallback");
                Ok(Routed {
                    value,
                    resolution: Resolution::Degraded(cause),
                    trace,
                })
            }
            Err(err) => {
                warn!(
                    operation = op,
                    state = ?OperationState::Failed,
                    error = %err,
                    "local fallback failed"
                );
                Err(err)
            }
        }
    }
}

impl BookOrchestrator {
    /// Wire the HTTP client, corpus, lexicons, and file store from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote = HttpRemote::new(&config.remote)?;

        let corpus = match &config.corpus.path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read corpus: {}", path.display()))?;
                Corpus::from_json(&json)
                    .with_context(|| format!("Invalid corpus: {}", path.display()))?
            }
            None => Corpus::bundled().context("Invalid bundled corpus")?,
        };

        let policy = if config.translation.cascade {
            CascadePolicy::Cascade
        } else {
            CascadePolicy::Protect
        };
        let mut lexicons = LexiconRegistry::new();
        lexicons.register(
            Translator::urdu()
                .context("Invalid bundled lexicon")?
                .with_policy(policy),
        );

        let store = Arc::new(FileStore::new(&config.storage.dir));
        let local = LocalAssistant::new(corpus, lexicons, store, config.search.max_sources);

        Ok(Self::new(remote, local))
    }
}
