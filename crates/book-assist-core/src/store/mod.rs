//! Key-value storage abstraction for persisted translations.
//!
//! The [`KvStore`] trait is the only persistence capability the assistant
//! needs: whole-value `get` and `set` of string blobs. Each translated book is
//! one blob under [`translation_key`]; writes replace the whole value, so a
//! second translation into the same language is last-write-wins.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! [`memory::MemoryStore`] backs tests and WASM targets; the application crate
//! provides a file-backed store.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Language;

/// Storage key for the translated book in `language`:
/// `translated_content_<code>`.
pub fn translation_key(language: Language) -> String {
    format!("translated_content_{}", language.code())
}

/// Abstract string key-value backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](KvStore::get) | Read a whole value, `None` if absent |
/// | [`set`](KvStore::set) | Replace a whole value atomically |
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Must never leave a partially written value behind.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_key() {
        assert_eq!(translation_key(Language::Ur), "translated_content_ur");
        assert_eq!(translation_key(Language::En), "translated_content_en");
    }
}
