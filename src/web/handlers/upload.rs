//! Upload handler.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};

use super::{AppState, FILE_FIELD};
use crate::web::dto::UploadResponse;
use crate::web::error::ApiError;

/// Name recorded when the client sends no filename.
pub const FALLBACK_FILENAME: &str = "file";

/// POST /upload - Store one file and return its download link.
///
/// Request body: multipart/form-data with a `files[]` field. Other fields
/// are ignored.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();

        let entry = state.registry.upload(field, &original_name).await?;

        return Ok(Json(UploadResponse::single(
            state.file_url(&entry.id),
            entry.expires_at,
        )));
    }

    Err(ApiError::bad_request("No file attached"))
}
