//! Conversation state for one reader.
//!
//! A [`Session`] owns the append-only message log and enforces the
//! interaction rules around the orchestrator:
//!
//! - one submission in flight at a time (later ones get [`SessionError::Busy`]);
//! - every accepted submission appends exactly one user message and one
//!   assistant message, even when the operation fails;
//! - after [`close`](Session::close), late results are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use book_assist_core::models::Language;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::AssistError;
use crate::models::{Answer, Routed};
use crate::orchestrator::Orchestrator;
use crate::traits::{Backend, Probe};

/// Question sent along with a selected passage.
pub const SELECTION_QUESTION: &str = "Can you explain this concept from the book?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Assistant reply produced by the offline path.
    pub degraded: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("another request is still in progress")]
    Busy,

    #[error("input is empty")]
    EmptyInput,

    #[error("selection must be longer than {min} characters")]
    SelectionTooShort { min: usize },

    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("session is closed")]
    Closed,
}

struct SessionState {
    messages: Vec<ConversationMessage>,
    next_id: u64,
    language: Language,
}

impl SessionState {
    fn push(&mut self, role: Role, content: String, degraded: bool) -> ConversationMessage {
        self.next_id += 1;
        let message = ConversationMessage {
            id: self.next_id,
            role,
            content,
            created_at: Utc::now(),
            degraded,
        };
        self.messages.push(message.clone());
        message
    }
}

/// Clears the busy flag when a submission ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(flag))
            .map_err(|_| SessionError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session<R, L> {
    orchestrator: Arc<Orchestrator<R, L>>,
    state: Mutex<SessionState>,
    busy: AtomicBool,
    closed: AtomicBool,
    min_selection_chars: usize,
}

impl<R, L> Session<R, L>
where
    R: Backend + Probe,
    L: Backend,
{
    pub fn new(orchestrator: Arc<Orchestrator<R, L>>, config: &SessionConfig) -> Self {
        let mut state = SessionState {
            messages: Vec::new(),
            next_id: 0,
            language: config.language(),
        };
        if let Some(greeting) = config.greeting.as_deref().filter(|g| !g.trim().is_empty()) {
            state.push(Role::Assistant, greeting.to_string(), false);
        }

        Self {
            orchestrator,
            state: Mutex::new(state),
            busy: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            min_selection_chars: config.min_selection_chars,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator<R, L>> {
        &self.orchestrator
    }

    /// Snapshot of the conversation, oldest first.
    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.state().messages.clone()
    }

    pub fn language(&self) -> Language {
        self.state().language
    }

    /// True while a submission is in flight; input should be disabled.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Mark the session as abandoned. Results that complete afterwards are
    /// not appended.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Switch the answer language. On error the language is unchanged.
    pub fn change_language(&self, code: &str) -> Result<Language, SessionError> {
        let language: Language = code
            .parse()
            .map_err(|_| SessionError::UnsupportedLanguage(code.trim().to_string()))?;
        self.state().language = language;
        debug!(language = %language, "session language changed");
        Ok(language)
    }

    /// Ask a free-text question. Returns the assistant reply.
    pub async fn submit_query(&self, text: &str) -> Result<ConversationMessage, SessionError> {
        let question = text.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.submit(question.to_string(), |orch, language| async move {
            orch.ask(question, language).await
        })
        .await
    }

    /// Ask for an explanation of a selected passage. Returns the assistant
    /// reply.
    pub async fn submit_selection_question(
        &self,
        selected: &str,
    ) -> Result<ConversationMessage, SessionError> {
        let selection = selected.trim();
        if selection.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if selection.chars().count() <= self.min_selection_chars {
            return Err(SessionError::SelectionTooShort {
                min: self.min_selection_chars,
            });
        }
        let user_content = format!("About this text: \"{}\"", selection);
        self.submit(user_content, |orch, language| async move {
            orch.ask_selection(selection, SELECTION_QUESTION, language)
                .await
        })
        .await
    }

    async fn submit<'a, F, Fut>(
        &'a self,
        user_content: String,
        run: F,
    ) -> Result<ConversationMessage, SessionError>
    where
        F: FnOnce(&'a Orchestrator<R, L>, Language) -> Fut,
        Fut: std::future::Future<Output = Result<Routed<Answer>, AssistError>>,
    {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let _guard = BusyGuard::acquire(&self.busy)?;

        let language = {
            let mut state = self.state();
            state.push(Role::User, user_content, false);
            state.language
        };

        let result = run(&*self.orchestrator, language).await;

        if self.is_closed() {
            debug!("session closed while waiting, discarding reply");
            return Err(SessionError::Closed);
        }

        let (content, degraded) = match result {
            Ok(routed) => {
                let degraded = routed.is_degraded();
                (routed.value.text, degraded)
            }
            Err(err) => (err.user_message(), false),
        };
        Ok(self.state().push(Role::Assistant, content, degraded))
    }
}
