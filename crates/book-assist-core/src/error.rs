//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while loading or using the corpus, lexicons, and languages.
///
/// Search and translation themselves are total; these errors only come
/// from loading data or from asking for a language the crate cannot serve.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("invalid corpus: {0}")]
    InvalidCorpus(String),

    #[error("invalid lexicon: {0}")]
    InvalidLexicon(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
