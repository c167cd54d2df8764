//! Health endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::{DefaultState, SlotStatus};
use crate::llm::Provider;

use super::AppState;

// ============================================================================
// Health Endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when the default index is loaded, `degraded` otherwise
    pub status: &'static str,
    pub version: &'static str,
    pub knowledge: SlotStatus,
    pub providers: Vec<Provider>,
    pub default_provider: Provider,
}

/// GET /health - Report slot state and configured providers
///
/// Does not trigger a default load; a not-yet-loaded index shows as
/// `uninitialized`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let knowledge = state.slots.status();
    let status = match knowledge.default_state {
        DefaultState::Loaded => "ok",
        DefaultState::Uninitialized | DefaultState::LoadFailed => "degraded",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        knowledge,
        providers: state.llm.providers(),
        default_provider: state.config.llm.default_provider,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;

    #[tokio::test]
    async fn test_health_before_and_after_load() {
        let (state, _dir) = test_support::state();

        let Json(before) = health(State(state.clone())).await;
        assert_eq!(before.status, "degraded");
        assert_eq!(before.knowledge.default_state, DefaultState::Uninitialized);
        assert_eq!(before.providers, Provider::ALL.to_vec());

        assert!(state.slots.warm_up());
        let Json(after) = health(State(state)).await;
        assert_eq!(after.status, "ok");
        assert_eq!(after.knowledge.default_entries, Some(2));
    }
}
