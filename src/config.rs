use anyhow::{bail, Context, Result};
use book_assist_core::models::Language;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            probe_timeout_ms: default_probe_timeout_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            user_id: None,
        }
    }
}

impl RemoteConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_probe_timeout_ms() -> u64 {
    2000
}
fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_sources: default_max_sources(),
        }
    }
}

fn default_max_sources() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_min_selection_chars")]
    pub min_selection_chars: usize,
    #[serde(default)]
    pub greeting: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            default_language: default_language(),
            min_selection_chars: default_min_selection_chars(),
            greeting: None,
        }
    }
}

impl SessionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The configured default language.
    ///
    /// [`load_config`] rejects unknown codes. A config built in code skips
    /// that check, so an unknown code logs a warning and falls back to
    /// English.
    pub fn language(&self) -> Language {
        match self.default_language.parse() {
            Ok(language) => language,
            Err(_) => {
                warn!(
                    code = %self.default_language,
                    "unsupported session.default_language, using en"
                );
                Language::En
            }
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}
fn default_language() -> String {
    "en".to_string()
}
fn default_min_selection_chars() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./data/kv")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorpusConfig {
    /// JSON file replacing the bundled corpus.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TranslationConfig {
    /// Let later lexicon rules rewrite earlier substitutions.
    #[serde(default)]
    pub cascade: bool,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate remote
    let base_url = config.remote.base_url.as_str();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        bail!("remote.base_url must start with http:// or https://");
    }
    if config.remote.probe_timeout_ms == 0 {
        bail!("remote.probe_timeout_ms must be > 0");
    }
    if config.remote.request_timeout_secs == 0 {
        bail!("remote.request_timeout_secs must be > 0");
    }

    // Validate search
    if config.search.max_sources < 1 {
        bail!("search.max_sources must be >= 1");
    }

    // Validate session
    if config.session.debounce_ms == 0 {
        bail!("session.debounce_ms must be > 0");
    }
    config
        .session
        .default_language
        .parse::<Language>()
        .with_context(|| {
            format!(
                "session.default_language '{}' is not a supported language",
                config.session.default_language
            )
        })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.remote.base_url, "http://localhost:8000");
        assert_eq!(cfg.remote.probe_timeout(), Duration::from_secs(2));
        assert_eq!(cfg.search.max_sources, 3);
        assert_eq!(cfg.session.debounce(), Duration::from_millis(500));
        assert_eq!(cfg.session.language(), Language::En);
        assert_eq!(cfg.session.min_selection_chars, 10);
        assert!(cfg.corpus.path.is_none());
        assert!(!cfg.translation.cascade);
    }

    #[test]
    fn test_full_config() {
        let cfg = parse_config(
            r#"
[remote]
base_url = "https://book.example.com"
probe_timeout_ms = 750
request_timeout_secs = 10
user_id = "reader-1"

[search]
max_sources = 5

[session]
debounce_ms = 250
default_language = "ur"
greeting = "Hello!"

[storage]
dir = "/tmp/kv"

[translation]
cascade = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.remote.user_id.as_deref(), Some("reader-1"));
        assert_eq!(cfg.remote.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.search.max_sources, 5);
        assert_eq!(cfg.session.language(), Language::Ur);
        assert_eq!(cfg.session.greeting.as_deref(), Some("Hello!"));
        assert_eq!(cfg.storage.dir, PathBuf::from("/tmp/kv"));
        assert!(cfg.translation.cascade);
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = parse_config("[remote]\nbase_url = \"localhost:8000\"").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_rejects_unknown_language() {
        let err = parse_config("[session]\ndefault_language = \"fr\"").unwrap_err();
        assert!(err.to_string().contains("default_language"));
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(parse_config("[search]\nmax_sources = 0").is_err());
        assert!(parse_config("[remote]\nprobe_timeout_ms = 0").is_err());
        assert!(parse_config("[session]\ndebounce_ms = 0").is_err());
    }

    #[test]
    fn test_unvalidated_language_falls_back_to_english() {
        let session = SessionConfig {
            default_language: "klingon".to_string(),
            ..SessionConfig::default()
        };
        assert_eq!(session.language(), Language::En);

        let session = SessionConfig {
            default_language: " UR ".to_string(),
            ..SessionConfig::default()
        };
        assert_eq!(session.language(), Language::Ur);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/bookctl.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
