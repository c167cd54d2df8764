//! REST API module using Axum
//!
//! Provides the HTTP surface of the assistant:
//! - JSON endpoints for asking questions and managing the custom knowledge base
//! - The single-page UI served via `rust-embed` (compiled into the binary)

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use rust_embed::Embed;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Web UI assets from `static/`.
#[derive(Embed)]
#[folder = "static/"]
struct UiAssets;

/// Serve a static asset, or `index.html` for the root and unknown paths.
async fn serve_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if !path.is_empty() {
        if let Some(content) = UiAssets::get(path) {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            return (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.into_owned(),
            )
                .into_response();
        }
    }

    if let Some(index) = UiAssets::get("index.html") {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            index.data.into_owned(),
        )
            .into_response();
    }

    (StatusCode::NOT_FOUND, "UI not bundled").into_response()
}

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `RAGDESK_CORS_ORIGINS` to a comma-separated list of allowed origins
/// when the UI is hosted elsewhere.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var("RAGDESK_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router with API and UI serving.
pub fn create_app(state: AppState) -> Router {
    let cors = build_cors_layer();
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .merge(routes::api_routes(state))
        .fallback(serve_asset)
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
