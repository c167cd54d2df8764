//! Question answering endpoint

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::envelope::ApiError;
use crate::context::ScoredEntry;
use crate::llm::Provider;

use super::AppState;

/// Request body for `POST /ask`.
///
/// `top_k` is signed so that zero and negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub use_custom: bool,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Retrieved entries plus the provider's answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub items: Vec<ScoredEntry>,
    pub answer: String,
    pub llm_provider: Provider,
}

/// POST /ask - Retrieve relevant entries and ask the chosen provider
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let top_k = match request.top_k {
        None => state.config.knowledge.default_top_k,
        Some(k) if k > 0 => usize::try_from(k).unwrap_or(usize::MAX),
        Some(_) => {
            return Err(ApiError::BadRequest("top_k must be > 0".to_string()));
        }
    };

    let provider = match request.provider.as_deref() {
        None => state.config.llm.default_provider,
        Some(name) => name.parse::<Provider>()?,
    };
    let backend = state.llm.get(provider).ok_or_else(|| {
        ApiError::BadRequest(format!("provider '{provider}' is not configured"))
    })?;

    // The first query may read the default document from disk.
    let slots = state.slots.clone();
    let question = request.question.clone();
    let use_custom = request.use_custom;
    let items = tokio::task::spawn_blocking(move || slots.ask(&question, top_k, use_custom))
        .await
        .map_err(|e| ApiError::Internal(format!("retrieval task failed: {e}")))??;

    let entries: Vec<_> = items.iter().map(|item| item.entry.clone()).collect();
    let answer = backend.generate(&request.question, &entries).await?;

    info!(
        provider = %provider,
        use_custom,
        top_k,
        matches = items.len(),
        "Answered question"
    );

    Ok(Json(AskResponse {
        items,
        answer,
        llm_provider: provider,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;

    fn request(question: &str, top_k: Option<i64>, provider: Option<&str>) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            top_k,
            use_custom: false,
            provider: provider.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_ask_uses_default_index_and_provider() {
        let (state, _dir) = test_support::state();
        let Json(resp) = ask(State(state), Json(request("сколько идет доставка", None, None)))
            .await
            .unwrap();

        assert_eq!(resp.llm_provider, Provider::YandexGpt);
        assert_eq!(resp.items[0].entry.title, "Доставка");
        assert_eq!(resp.answer, "Доставка");
    }

    #[tokio::test]
    async fn test_ask_rejects_non_positive_top_k() {
        let (state, _dir) = test_support::state();
        for k in [0, -1] {
            let err = ask(State(state.clone()), Json(request("q", Some(k), None)))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn test_ask_rejects_unknown_provider() {
        let (state, _dir) = test_support::state();
        let err = ask(State(state), Json(request("q", None, Some("openai"))))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Llm(_)));
    }

    #[tokio::test]
    async fn test_ask_with_no_matches_still_answers() {
        let (state, _dir) = test_support::state();
        let Json(resp) = ask(State(state), Json(request("zzz", Some(2), Some("gigachat"))))
            .await
            .unwrap();
        assert!(resp.items.is_empty());
        assert_eq!(resp.answer, "");
        assert_eq!(resp.llm_provider, Provider::GigaChat);
    }
}
