//! API route definitions
//!
//! - POST /ask - answer a question from the active knowledge base
//! - POST /upload_kb - install a custom knowledge base (multipart `file`)
//! - POST /reset_kb - return to the built-in knowledge base
//! - GET /health - slot state and configured providers

use axum::{routing::{get, post}, Router};

use super::handlers::{self, AppState};

/// Create all API routes
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(handlers::ask))
        .route("/upload_kb", post(handlers::upload_kb))
        .route("/reset_kb", post(handlers::reset_kb))
        .route("/health", get(handlers::health))
        .with_state(state)
}
