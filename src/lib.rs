//! # Book Assist
//!
//! An offline-capable assistant for a documentation book.
//!
//! Book Assist answers questions, searches the book, explains selected
//! passages, and translates the whole book. Each operation tries the remote
//! answering service first and falls back to the bundled corpus when the
//! service is unreachable or fails, so the assistant keeps working offline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Session    │──▶│ Orchestrator │──▶│  HttpRemote  │
//! │  Debouncer   │   │ probe + route│   │ /query ...   │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │ fallback
//!                           ▼
//!                   ┌────────────────┐   ┌──────────────┐
//!                   │ LocalAssistant │──▶│   KvStore    │
//!                   │ search+lexicon │   │ file / memory│
//!                   └────────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! bookctl health                    # is the remote service up?
//! bookctl search "perception sensors"
//! bookctl ask "How do humanoids walk?"
//! bookctl translate ur              # translate and persist the book
//! bookctl chat                      # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Routing and result types |
//! | [`error`] | Error taxonomy |
//! | [`traits`] | `Backend` and `Probe` traits |
//! | [`remote`] | HTTP client for the answering service |
//! | [`local`] | Offline answering from the bundled corpus |
//! | [`orchestrator`] | Remote-first routing with local fallback |
//! | [`session`] | Conversation state and submission rules |
//! | [`debounce`] | Search-as-you-type |
//! | [`kv_file`] | File-backed key-value store |
//! | [`output`] | CLI rendering |

pub mod config;
pub mod debounce;
pub mod error;
pub mod kv_file;
pub mod local;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod remote;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
