//! # Book Assist Core
//!
//! Shared, WASM-safe logic for Book Assist: the bundled book corpus, the
//! lexical search engine, the dictionary translator, and the key-value
//! store abstraction used to persist translated content.
//!
//! This crate contains no tokio, network, or filesystem dependencies. The
//! bundled corpus and lexicons are embedded at compile time, so it compiles
//! to both native targets and `wasm32-unknown-unknown`.

pub mod corpus;
pub mod error;
pub mod models;
pub mod search;
pub mod store;
pub mod translate;

pub use error::CoreError;
