//! Error taxonomy for assistant operations.
//!
//! | Variant | Handling |
//! |---------|----------|
//! | [`Unreachable`](AssistError::Unreachable), [`RemoteStatus`](AssistError::RemoteStatus), [`RemoteRejected`](AssistError::RemoteRejected), [`InvalidResponse`](AssistError::InvalidResponse) | Caught by the orchestrator; trigger the local fallback |
//! | [`UnsupportedLanguage`](AssistError::UnsupportedLanguage) | Surfaced immediately; no fallback |
//! | [`EmptyInput`](AssistError::EmptyInput) | Rejected before probing |
//! | [`Storage`](AssistError::Storage) | Reported as a warning next to a successful translation |
//! | [`Local`](AssistError::Local) | The offline path itself failed; the operation fails |
//!
//! "Nothing found" is not an error: it is the
//! [`SearchOutcome::NoResults`](book_assist_core::search::SearchOutcome::NoResults)
//! value, so it can never be confused with unavailability.

use book_assist_core::models::Language;
use book_assist_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("remote service unreachable: {0}")]
    Unreachable(String),

    #[error("remote service returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("remote service rejected the request: {0}")]
    RemoteRejected(String),

    #[error("invalid response from remote service: {0}")]
    InvalidResponse(String),

    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("empty input")]
    EmptyInput,

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("local fallback failed: {0}")]
    Local(String),
}

impl AssistError {
    /// True for failures of the remote service (network, status, payload).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AssistError::Unreachable(_)
                | AssistError::RemoteStatus { .. }
                | AssistError::RemoteRejected(_)
                | AssistError::InvalidResponse(_)
        )
    }

    /// Text shown to the user when an operation ends in this error.
    pub fn user_message(&self) -> String {
        match self {
            AssistError::UnsupportedLanguage(code) => {
                let available: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
                format!(
                    "Sorry, the language '{}' is not supported. Available languages: {}.",
                    code,
                    available.join(", ")
                )
            }
            AssistError::EmptyInput => "Please enter a question first.".to_string(),
            _ => "Sorry, I encountered an error. Please try again.".to_string(),
        }
    }
}

impl From<CoreError> for AssistError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedLanguage(code) => AssistError::UnsupportedLanguage(code),
            other => AssistError::Local(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AssistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AssistError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            AssistError::RemoteStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            AssistError::Unreachable(err.to_string())
        }
    }
}
