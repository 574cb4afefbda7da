//! Scripted backends for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use book_assist_core::models::Language;
use tokio::sync::Semaphore;

use crate::error::AssistError;
use crate::models::{Answer, Availability, SearchReply, TranslationReport};
use crate::traits::{Backend, Probe};

/// Remote double with switchable reachability and failure.
///
/// With a gate, every call waits for a permit, which lets tests hold an
/// operation in flight. With a delay, every call sleeps before answering.
pub(crate) struct ScriptedRemote {
    reachable: AtomicBool,
    failing: bool,
    probes: AtomicUsize,
    calls: AtomicUsize,
    completed: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
}

impl ScriptedRemote {
    fn build(reachable: bool, failing: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
            failing,
            probes: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            gate: None,
            delay: None,
        }
    }

    pub fn online() -> Self {
        Self::build(true, false)
    }

    pub fn offline() -> Self {
        Self::build(false, false)
    }

    /// Reachable, but every call returns HTTP 500.
    pub fn failing() -> Self {
        Self::build(true, true)
    }

    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that got past the gate and the delay.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    async fn respond<T: Send>(&self, value: T) -> Result<T, AssistError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| AssistError::Unreachable(e.to_string()))?;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AssistError::RemoteStatus {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(value)
    }
}

#[async_trait]
impl Probe for ScriptedRemote {
    async fn probe(&self) -> Availability {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Availability::Reachable
        } else {
            Availability::Unreachable("connection refused".to_string())
        }
    }
}

fn remote_answer(text: String) -> Answer {
    Answer {
        text,
        sources: vec!["remote".to_string()],
        confidence: Some(0.9),
        explanation: None,
    }
}

#[async_trait]
impl Backend for ScriptedRemote {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str, _language: Language) -> Result<SearchReply, AssistError> {
        self.respond(SearchReply::Answer(remote_answer(format!("remote: {}", query))))
            .await
    }

    async fn ask(&self, question: &str, _language: Language) -> Result<Answer, AssistError> {
        self.respond(remote_answer(format!("remote: {}", question)))
            .await
    }

    async fn ask_selection(
        &self,
        selected_text: &str,
        _question: &str,
        _language: Language,
    ) -> Result<Answer, AssistError> {
        let mut answer = remote_answer(format!("remote explains: {}", selected_text));
        answer.explanation = Some("remote explanation".to_string());
        self.respond(answer).await
    }

    async fn translate_book(&self, language: Language) -> Result<TranslationReport, AssistError> {
        self.respond(TranslationReport {
            language,
            message: "remote translation started".to_string(),
            url: Some(format!("/docs/{}", language.code())),
            sections: None,
            storage_warning: None,
        })
        .await
    }
}

/// Local double whose every operation fails.
pub(crate) struct FailingLocal;

#[async_trait]
impl Backend for FailingLocal {
    fn name(&self) -> &str {
        "failing-local"
    }

    async fn search(&self, _query: &str, _language: Language) -> Result<SearchReply, AssistError> {
        Err(AssistError::Local("corpus unavailable".to_string()))
    }

    async fn ask(&self, _question: &str, _language: Language) -> Result<Answer, AssistError> {
        Err(AssistError::Local("corpus unavailable".to_string()))
    }

    async fn ask_selection(
        &self,
        _selected_text: &str,
        _question: &str,
        _language: Language,
    ) -> Result<Answer, AssistError> {
        Err(AssistError::Local("corpus unavailable".to_string()))
    }

    async fn translate_book(&self, _language: Language) -> Result<TranslationReport, AssistError> {
        Err(AssistError::Local("corpus unavailable".to_string()))
    }
}
