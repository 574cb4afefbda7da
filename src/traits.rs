//! Backend traits behind the fallback orchestrator.
//!
//! The orchestrator routes every operation to one of two [`Backend`]s: the
//! remote answering service or the local corpus. Which one is used is
//! decided by a fresh [`Probe`] before each operation.
//!
//! # Architecture
//!
//! ```text
//!                ┌──────────────────────┐
//!   operation ──▶│     Orchestrator     │
//!                │  probe() per call    │
//!                └──────┬────────┬──────┘
//!             Reachable │        │ Unreachable / remote error
//!                       ▼        ▼
//!              ┌──────────┐  ┌────────────────────────┐
//!              │HttpRemote│  │ LocalAssistant         │
//!              │ /query   │  │ search + lexicon + kv  │
//!              └──────────┘  └────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use book_assist::config::Config;
//! use book_assist::local::LocalAssistant;
//! use book_assist::orchestrator::Orchestrator;
//! use book_assist::remote::HttpRemote;
//! use book_assist_core::store::memory::MemoryStore;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let remote = HttpRemote::new(&config.remote)?;
//! let local = LocalAssistant::bundled(Arc::new(MemoryStore::new()), 3)?;
//! let orchestrator = Orchestrator::new(remote, local);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use book_assist_core::models::Language;

use crate::error::AssistError;
use crate::models::{Answer, Availability, SearchReply, TranslationReport};

/// Something that can answer the four assistant operations.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use book_assist::error::AssistError;
/// use book_assist::models::{Answer, SearchReply, TranslationReport};
/// use book_assist::traits::Backend;
/// use book_assist_core::models::Language;
///
/// pub struct Offline;
///
/// #[async_trait]
/// impl Backend for Offline {
///     fn name(&self) -> &str { "offline" }
///
///     async fn search(&self, _q: &str, _l: Language) -> Result<SearchReply, AssistError> {
///         Err(AssistError::Unreachable("offline".into()))
///     }
///     async fn ask(&self, _q: &str, _l: Language) -> Result<Answer, AssistError> {
///         Err(AssistError::Unreachable("offline".into()))
///     }
///     async fn ask_selection(&self, _s: &str, _q: &str, _l: Language) -> Result<Answer, AssistError> {
///         Err(AssistError::Unreachable("offline".into()))
///     }
///     async fn translate_book(&self, _l: Language) -> Result<TranslationReport, AssistError> {
///         Err(AssistError::Unreachable("offline".into()))
///     }
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in logs (e.g. `"remote"`, `"local"`).
    fn name(&self) -> &str;

    /// Whether [`translate_book`](Backend::translate_book) can produce
    /// `language` at all.
    ///
    /// The orchestrator checks the local backend before probing, so an
    /// unsupported language is rejected without touching the network.
    fn supports_translation(&self, _language: Language) -> bool {
        true
    }

    /// Full-text search for `query`.
    async fn search(&self, query: &str, language: Language) -> Result<SearchReply, AssistError>;

    /// Answer a free-text question.
    async fn ask(&self, question: &str, language: Language) -> Result<Answer, AssistError>;

    /// Answer `question` about a passage the reader selected.
    async fn ask_selection(
        &self,
        selected_text: &str,
        question: &str,
        language: Language,
    ) -> Result<Answer, AssistError>;

    /// Translate the whole book into `language`.
    async fn translate_book(&self, language: Language) -> Result<TranslationReport, AssistError>;
}

/// Reachability check run before each routed operation.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> Availability;
}
