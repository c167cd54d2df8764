//! YandexGPT client (foundation-models completion API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{http_client, user_prompt, LlmBackend, LlmError, Provider};
use crate::config::YandexConfig;
use crate::context::Entry;

const API_KEY_ENV: &str = "YANDEX_API_KEY";
const FOLDER_ID_ENV: &str = "YANDEX_FOLDER_ID";

/// API key plus the cloud folder the model is billed to.
#[derive(Debug, Clone)]
pub struct YandexCredentials {
    pub api_key: String,
    pub folder_id: String,
}

impl YandexCredentials {
    /// Read `YANDEX_API_KEY` and `YANDEX_FOLDER_ID`. Both must be non-empty.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let folder_id = std::env::var(FOLDER_ID_ENV).unwrap_or_default();
        if api_key.is_empty() || folder_id.is_empty() {
            return Err(LlmError::MissingCredentials {
                provider: Provider::YandexGpt,
                vars: "YANDEX_API_KEY and YANDEX_FOLDER_ID",
            });
        }
        Ok(Self { api_key, folder_id })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: [Message<'a>; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    text: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Deserialize)]
struct CompletionResult {
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    message: AlternativeMessage,
}

#[derive(Deserialize)]
struct AlternativeMessage {
    text: String,
}

pub struct YandexGptBackend {
    http: reqwest::Client,
    config: YandexConfig,
    system_prompt: String,
    credentials: Option<YandexCredentials>,
}

impl YandexGptBackend {
    pub fn new(
        config: YandexConfig,
        system_prompt: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: http_client(Provider::YandexGpt, timeout, false)?,
            config,
            system_prompt: system_prompt.to_string(),
            credentials: None,
        })
    }

    /// Use fixed credentials instead of reading the environment per request.
    pub fn with_credentials(mut self, credentials: YandexCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn credentials(&self) -> Result<YandexCredentials, LlmError> {
        match &self.credentials {
            Some(c) => Ok(c.clone()),
            None => YandexCredentials::from_env(),
        }
    }
}

#[async_trait]
impl LlmBackend for YandexGptBackend {
    async fn generate(&self, question: &str, entries: &[Entry]) -> Result<String, LlmError> {
        let creds = self.credentials()?;
        let user_text = user_prompt(question, entries);

        let body = CompletionRequest {
            model_uri: format!("gpt://{}/{}", creds.folder_id, self.config.model),
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            },
            messages: [
                Message {
                    role: "system",
                    text: &self.system_prompt,
                },
                Message {
                    role: "user",
                    text: &user_text,
                },
            ],
        };

        debug!(entries = entries.len(), "Sending YandexGPT completion request");

        let resp = self
            .http
            .post(&self.config.endpoint)
            .header("Authorization", format!("Api-Key {}", creds.api_key))
            .header("x-folder-id", &creds.folder_id)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::http(Provider::YandexGpt))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(LlmError::Status {
                provider: Provider::YandexGpt,
                status,
            });
        }

        let parsed: CompletionResponse = resp.json().await.map_err(|e| LlmError::Malformed {
            provider: Provider::YandexGpt,
            message: e.to_string(),
        })?;

        parsed
            .result
            .alternatives
            .into_iter()
            .next()
            .map(|alt| alt.message.text)
            .ok_or_else(|| LlmError::Malformed {
                provider: Provider::YandexGpt,
                message: "no alternatives in result".to_string(),
            })
    }

    fn provider(&self) -> Provider {
        Provider::YandexGpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn backend(server: &MockServer) -> YandexGptBackend {
        let config = YandexConfig {
            endpoint: format!("{}/foundationModels/v1/completion", server.uri()),
            ..YandexConfig::default()
        };
        YandexGptBackend::new(config, "system", Duration::from_secs(5))
            .unwrap()
            .with_credentials(YandexCredentials {
                api_key: "key-1".to_string(),
                folder_id: "folder-9".to_string(),
            })
    }

    #[tokio::test]
    async fn test_completion_request_and_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/foundationModels/v1/completion"))
            .and(header("Authorization", "Api-Key key-1"))
            .and(header("x-folder-id", "folder-9"))
            .and(body_partial_json(serde_json::json!({
                "modelUri": "gpt://folder-9/yandexgpt/latest",
                "completionOptions": {"stream": false, "maxTokens": 800},
                "messages": [
                    {"role": "system", "text": "system"},
                    {"role": "user", "text": "Вопрос клиента:\nПривет"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"alternatives": [{"message": {"role": "assistant", "text": "Здравствуйте"}}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = backend(&server).generate("Привет", &[]).await.unwrap();
        assert_eq!(answer, "Здравствуйте");
    }

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = backend(&server).generate("q", &[]).await.unwrap_err();
        match err {
            LlmError::Status { status, .. } => assert_eq!(status.as_u16(), 401),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_alternatives_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"result": {"alternatives": []}})),
            )
            .mount(&server)
            .await;

        let err = backend(&server).generate("q", &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Malformed { .. }));
    }
}
