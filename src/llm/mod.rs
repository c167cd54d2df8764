//! LLM Backend Module
//!
//! Answers a question from the entries the retriever picked. Two hosted
//! providers are supported:
//!
//! - **YandexGPT** (`yandexgpt`): foundation-models completion API, API-key auth
//! - **GigaChat** (`gigachat`): OAuth client-credentials, then chat completions
//!
//! Both receive the same user prompt: the question followed by the selected
//! entries as context. Credentials are read from the environment on each
//! request unless injected explicitly, so a key can be added without a restart.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::context::Entry;

mod gigachat;
mod yandex;

pub use gigachat::{GigaChatBackend, GigaChatCredentials};
pub use yandex::{YandexCredentials, YandexGptBackend};

/// Separator placed between entries in the prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Hosted LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    #[serde(rename = "yandexgpt")]
    YandexGpt,
    #[serde(rename = "gigachat")]
    GigaChat,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::YandexGpt, Provider::GigaChat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::YandexGpt => "yandexgpt",
            Provider::GigaChat => "gigachat",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| LlmError::UnknownProvider(s.to_string()))
    }
}

/// Errors returned by provider backends.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("{provider}: {vars} not set")]
    MissingCredentials {
        provider: Provider,
        vars: &'static str,
    },

    #[error("{provider}: request failed: {source}")]
    Http {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: HTTP {status}")]
    Status {
        provider: Provider,
        status: reqwest::StatusCode,
    },

    #[error("{provider}: unexpected response: {message}")]
    Malformed { provider: Provider, message: String },
}

impl LlmError {
    pub(crate) fn http(provider: Provider) -> impl FnOnce(reqwest::Error) -> LlmError {
        move |source| LlmError::Http { provider, source }
    }
}

/// Unified trait for LLM backends
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Answer `question` using `entries` as the knowledge context.
    async fn generate(&self, question: &str, entries: &[Entry]) -> Result<String, LlmError>;

    /// Provider this backend talks to
    fn provider(&self) -> Provider;

    /// Get the backend name for logging
    fn backend_name(&self) -> &'static str {
        self.provider().as_str()
    }
}

/// Join `title` and `body` of each entry into one context string.
///
/// Entries whose combined text is blank are skipped.
pub fn build_context(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}\n{}", e.title, e.body).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// User message: the question, plus the knowledge context when there is one.
pub fn user_prompt(question: &str, entries: &[Entry]) -> String {
    let mut text = format!("Вопрос клиента:\n{question}");
    let context = build_context(entries);
    if !context.is_empty() {
        text.push_str("\n\nОтветь на основе базы знаний:\n");
        text.push_str(&context);
    }
    text
}

/// Shared reqwest client for a provider.
pub(crate) fn http_client(
    provider: Provider,
    timeout: Duration,
    accept_invalid_certs: bool,
) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(LlmError::http(provider))
}

/// Backends by provider.
#[derive(Clone, Default)]
pub struct LlmRegistry {
    backends: HashMap<Provider, Arc<dyn LlmBackend>>,
}

impl LlmRegistry {
    /// Build both provider backends from config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let yandex = YandexGptBackend::new(config.yandex.clone(), &config.system_prompt, timeout)?;
        let gigachat =
            GigaChatBackend::new(config.gigachat.clone(), &config.system_prompt, timeout)?;

        Ok(Self::default()
            .with_backend(Arc::new(yandex))
            .with_backend(Arc::new(gigachat)))
    }

    /// Register (or replace) the backend for its provider.
    pub fn with_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.backends.insert(backend.provider(), backend);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn LlmBackend>> {
        self.backends.get(&provider).cloned()
    }

    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.backends.contains_key(p))
            .collect()
    }
}
