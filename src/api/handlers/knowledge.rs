//! Custom knowledge-base upload and reset

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::envelope::ApiError;

use super::AppState;

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub entries: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
}

/// Decode uploaded bytes as UTF-8, dropping invalid sequences.
pub fn decode_upload(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// POST /upload_kb - Replace the custom knowledge base with an uploaded file
pub async fn upload_kb(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::BadRequest("no file provided".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
        let text = decode_upload(&bytes);
        let entries = state.slots.load_custom(&text)?;

        info!(filename = %filename, bytes = bytes.len(), entries, "Custom knowledge base loaded");
        return Ok(Json(UploadResponse {
            status: "ok".to_string(),
            entries,
        }));
    }

    Err(ApiError::BadRequest("no file provided".to_string()))
}

/// POST /reset_kb - Drop the custom knowledge base
pub async fn reset_kb(State(state): State<AppState>) -> Json<ResetResponse> {
    state.slots.reset_custom();
    Json(ResetResponse {
        status: "ok".to_string(),
    })
}
