//! Error envelope shared by all endpoints.
//!
//! Every failure is rendered as
//! `{ "detail": "...", "error": { "code": "...", "message": "..." } }`.
//! `detail` is what the web page shows; `error.code` is stable for clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;

use crate::context::KnowledgeError;
use crate::llm::LlmError;

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error body: `{ "detail": "...", "error": { "code": "...", "message": "..." } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub detail: String,
    pub error: ErrorDetail,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let message = msg.into();
        let body = Self {
            detail: message.clone(),
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }
}

/// Handler error, converted from the domain errors with `?`.
#[derive(Debug)]
pub enum ApiError {
    Knowledge(KnowledgeError),
    Llm(LlmError),
    BadRequest(String),
    Internal(String),
}

impl From<KnowledgeError> for ApiError {
    fn from(e: KnowledgeError) -> Self {
        ApiError::Knowledge(e)
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        ApiError::Llm(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Knowledge(e @ KnowledgeError::DefaultLoad { .. }) => {
                ApiErrorResponse::service_unavailable(e.to_string())
            }
            ApiError::Knowledge(e) => ApiErrorResponse::bad_request(e.to_string()),
            ApiError::Llm(e @ LlmError::UnknownProvider(_)) => {
                ApiErrorResponse::bad_request(e.to_string())
            }
            ApiError::Llm(e) => {
                warn!(error = %e, "LLM provider call failed");
                ApiErrorResponse::bad_gateway(e.to_string())
            }
            ApiError::BadRequest(msg) => ApiErrorResponse::bad_request(msg),
            ApiError::Internal(msg) => ApiErrorResponse::internal(msg),
        }
    }
}
