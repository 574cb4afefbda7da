//! HTTP client for the remote answering service.
//!
//! Endpoints:
//!
//! | Method | Path | Request | Response |
//! |--------|------|---------|----------|
//! | `GET` | `/health` | | any 2xx |
//! | `POST` | `/query` | `{query, language, user_id?}` | `{answer, sources, confidence}` |
//! | `POST` | `/select-text-ask` | `{selected_text, question, language, user_id?}` | `{answer, explanation}` |
//! | `POST` | `/translate-book` | `{target_language, user_id?}` | `{success, message, translated_content_url?}` |
//!
//! Every failure (transport, timeout, non-2xx status, undecodable body, or
//! `success: false`) is returned as a remote [`AssistError`], which the
//! orchestrator turns into a local fallback.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use book_assist_core::models::Language;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::AssistError;
use crate::models::{Answer, Availability, SearchReply, TranslationReport};
use crate::traits::{Backend, Probe};

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    answer: String,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SelectionRequest<'a> {
    selected_text: &'a str,
    question: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SelectionResponse {
    answer: String,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    target_language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    translated_content_url: Option<String>,
}

/// Client for the remote answering service.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
    user_id: Option<String>,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            probe_timeout: config.probe_timeout(),
            user_id: config.user_id.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, AssistError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AssistError::RemoteStatus {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| AssistError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Probe for HttpRemote {
    async fn probe(&self) -> Availability {
        let result = self
            .client
            .get(self.url("/health"))
            .timeout(self.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => Availability::Reachable,
            Ok(response) => {
                Availability::Unreachable(format!("health check returned {}", response.status()))
            }
            Err(e) => Availability::Unreachable(e.to_string()),
        }
    }
}

#[async_trait]
impl Backend for HttpRemote {
    fn name(&self) -> &str {
        "remote"
    }

    /// The service answers searches through `/query`.
    async fn search(&self, query: &str, language: Language) -> Result<SearchReply, AssistError> {
        self.ask(query, language).await.map(SearchReply::Answer)
    }

    async fn ask(&self, question: &str, language: Language) -> Result<Answer, AssistError> {
        let request = QueryRequest {
            query: question,
            language: language.code(),
            user_id: self.user_id.as_deref(),
        };
        let response: QueryResponse = self.post("/query", &request).await?;
        debug!(sources = response.sources.len(), "remote answered query");

        Ok(Answer {
            text: response.answer,
            sources: response.sources,
            confidence: response.confidence,
            explanation: None,
        })
    }

    async fn ask_selection(
        &self,
        selected_text: &str,
        question: &str,
        language: Language,
    ) -> Result<Answer, AssistError> {
        let request = SelectionRequest {
            selected_text,
            question,
            language: language.code(),
            user_id: self.user_id.as_deref(),
        };
        let response: SelectionResponse = self.post("/select-text-ask", &request).await?;

        Ok(Answer {
            text: response.answer,
            sources: Vec::new(),
            confidence: None,
            explanation: response.explanation,
        })
    }

    async fn translate_book(&self, language: Language) -> Result<TranslationReport, AssistError> {
        let request = TranslateRequest {
            target_language: language.code(),
            user_id: self.user_id.as_deref(),
        };
        let response: TranslateResponse = self.post("/translate-book", &request).await?;

        if !response.success {
            return Err(AssistError::RemoteRejected(response.message));
        }

        Ok(TranslationReport {
            language,
            message: response.message,
            url: response.translated_content_url,
            sections: None,
            storage_warning: None,
        })
    }
}
