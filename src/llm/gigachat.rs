//! GigaChat client.
//!
//! Two round trips: an OAuth client-credentials exchange for a short-lived
//! access token, then the chat-completions call with that token. Tokens are
//! cached until shortly before `expires_at` and dropped on a 401.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{http_client, user_prompt, LlmBackend, LlmError, Provider, CONTEXT_SEPARATOR};
use crate::config::GigaChatConfig;
use crate::context::Entry;

const AUTH_DATA_ENV: &str = "GIGACHAT_AUTH_DATA";
const SCOPE_ENV: &str = "GIGACHAT_SCOPE";

/// Tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_MARGIN_MS: i64 = 60_000;

/// Base64 client credentials and the OAuth scope to request.
#[derive(Debug, Clone)]
pub struct GigaChatCredentials {
    pub auth_data: String,
    pub scope: String,
}

impl GigaChatCredentials {
    /// Read `GIGACHAT_AUTH_DATA` and, optionally, `GIGACHAT_SCOPE`.
    pub fn from_env(default_scope: &str) -> Result<Self, LlmError> {
        let auth_data = std::env::var(AUTH_DATA_ENV).unwrap_or_default();
        if auth_data.is_empty() {
            return Err(LlmError::MissingCredentials {
                provider: Provider::GigaChat,
                vars: "GIGACHAT_AUTH_DATA",
            });
        }
        let scope = std::env::var(SCOPE_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_scope.to_string());
        Ok(Self { auth_data, scope })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Unix epoch milliseconds.
    expires_at: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    auth_data: String,
    value: String,
    expires_at: i64,
}

impl CachedToken {
    fn usable_for(&self, auth_data: &str, now_ms: i64) -> bool {
        self.auth_data == auth_data && self.expires_at - TOKEN_REFRESH_MARGIN_MS > now_ms
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct GigaChatBackend {
    http: reqwest::Client,
    config: GigaChatConfig,
    system_prompt: String,
    credentials: Option<GigaChatCredentials>,
    token: Mutex<Option<CachedToken>>,
}

impl GigaChatBackend {
    pub fn new(
        config: GigaChatConfig,
        system_prompt: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: http_client(Provider::GigaChat, timeout, config.accept_invalid_certs)?,
            config,
            system_prompt: system_prompt.to_string(),
            credentials: None,
            token: Mutex::new(None),
        })
    }

    /// Use fixed credentials instead of reading the environment per request.
    pub fn with_credentials(mut self, credentials: GigaChatCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn credentials(&self) -> Result<GigaChatCredentials, LlmError> {
        match &self.credentials {
            Some(c) => Ok(c.clone()),
            None => GigaChatCredentials::from_env(&self.config.scope),
        }
    }

    /// Cached token, or a fresh one from the OAuth endpoint.
    async fn access_token(&self, creds: &GigaChatCredentials) -> Result<String, LlmError> {
        let mut cached = self.token.lock().await;
        let now = chrono::Utc::now().timestamp_millis();
        if let Some(token) = cached.as_ref().filter(|t| t.usable_for(&creds.auth_data, now)) {
            return Ok(token.value.clone());
        }

        let resp = self
            .http
            .post(&self.config.auth_url)
            .header("Authorization", format!("Basic {}", creds.auth_data))
            .header("RqUID", uuid::Uuid::new_v4().to_string())
            .header("Accept", "application/json")
            .form(&[("scope", creds.scope.as_str())])
            .send()
            .await
            .map_err(LlmError::http(Provider::GigaChat))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LlmError::Status {
                provider: Provider::GigaChat,
                status,
            });
        }

        let token: TokenResponse = resp.json().await.map_err(|e| LlmError::Malformed {
            provider: Provider::GigaChat,
            message: format!("token response: {e}"),
        })?;

        info!(expires_at = token.expires_at, "Obtained GigaChat access token");
        *cached = Some(CachedToken {
            auth_data: creds.auth_data.clone(),
            value: token.access_token.clone(),
            expires_at: token.expires_at,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl LlmBackend for GigaChatBackend {
    async fn generate(&self, question: &str, entries: &[Entry]) -> Result<String, LlmError> {
        let creds = self.credentials()?;
        let token = self.access_token(&creds).await?;

        // GigaChat gets the system prompt folded into one user message.
        let prompt = format!(
            "{}{}{}",
            self.system_prompt,
            CONTEXT_SEPARATOR,
            user_prompt(question, entries)
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        debug!(entries = entries.len(), "Sending GigaChat chat request");

        let resp = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(LlmError::http(Provider::GigaChat))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.token.lock().await.take();
        }
        if !status.is_success() {
            return Err(LlmError::Status {
                provider: Provider::GigaChat,
                status,
            });
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| LlmError::Malformed {
            provider: Provider::GigaChat,
            message: e.to_string(),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::Malformed {
                provider: Provider::GigaChat,
                message: "no choices in response".to_string(),
            })
    }

    fn provider(&self) -> Provider {
        Provider::GigaChat
    }
}
