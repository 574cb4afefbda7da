//! Data types produced by assistant operations.
//!
//! Every orchestrated operation returns a [`Routed`] value: the payload plus
//! how it was obtained ([`Resolution`]) and the states it passed through.

use book_assist_core::models::Language;
use book_assist_core::search::SearchOutcome;
use serde::Serialize;

/// Result of a reachability probe, computed fresh for every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Reachable,
    /// The probe failed; carries the reason for logs and messaging.
    Unreachable(String),
}

impl Availability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Availability::Reachable)
    }
}

/// Operations the orchestrator routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Ask,
    AskSelection,
    TranslateBook,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Ask => "ask",
            Operation::AskSelection => "ask_selection",
            Operation::TranslateBook => "translate_book",
        }
    }
}

/// States an operation moves through:
/// `Probing → {Remote, Local} → Succeeded | Degraded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Probing,
    Remote,
    Local,
    Succeeded,
    Degraded,
    Failed,
}

/// Why an operation was answered by the local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeCause {
    /// The probe failed, so the remote service was never called.
    ProbeFailed(String),
    /// The probe passed but the remote call failed.
    RemoteFailed(String),
}

/// How a successful operation was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Answered by the remote service (or needed no service at all).
    Succeeded,
    /// Answered by the local fallback.
    Degraded(DegradeCause),
}

/// An operation's payload together with its routing history.
#[derive(Debug, Clone)]
pub struct Routed<T> {
    pub value: T,
    pub resolution: Resolution,
    pub trace: Vec<OperationState>,
}

impl<T> Routed<T> {
    /// A value produced without contacting any service.
    pub fn immediate(value: T) -> Self {
        Self {
            value,
            resolution: Resolution::Succeeded,
            trace: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.resolution, Resolution::Degraded(_))
    }

    /// True when the offline indicator was set before any remote call.
    pub fn offline_from_start(&self) -> bool {
        matches!(
            self.resolution,
            Resolution::Degraded(DegradeCause::ProbeFailed(_))
        )
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Routed<U> {
        Routed {
            value: f(self.value),
            resolution: self.resolution,
            trace: self.trace,
        }
    }
}

/// An answer to a question about the book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    /// Ids of the corpus entries (or remote sources) the answer draws on.
    pub sources: Vec<String>,
    /// Relevance of the best source in `[0, 1]`, when known.
    pub confidence: Option<f64>,
    /// Extra context returned for selected-text questions.
    pub explanation: Option<String>,
}

/// Result of a search, in the shape the answering side produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchReply {
    /// The remote service answers searches with a composed answer.
    Answer(Answer),
    /// The local engine returns ranked matches.
    Lexical(SearchOutcome),
}

/// Outcome of a whole-book translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationReport {
    pub language: Language,
    pub message: String,
    /// Where the translated book can be read, if the producer said so.
    pub url: Option<String>,
    /// Number of translated sections, when known.
    pub sections: Option<usize>,
    /// Set when the translation succeeded but could not be persisted.
    pub storage_warning: Option<String>,
}
