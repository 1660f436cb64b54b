//! Upload proxy handler.

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use chrono::Utc;

use super::upload::FALLBACK_FILENAME;
use super::{AppState, FILE_FIELD};
use crate::proxy::ProxyError;
use crate::web::dto::UploadResponse;
use crate::web::error::ApiError;
use crate::TempdropError;

/// POST /upload-uguu - Forward one file to the upstream hosting API.
///
/// Nothing is stored locally. The expiry in the response is the one the
/// upstream advertises, not the registry TTL.
pub async fn upload_proxy(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let proxy = state
        .proxy
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Upload proxy is disabled"))?;

    let limit = state.registry.max_upload_size();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let content = read_limited(field, limit).await?;

        let url = match proxy.forward(&file_name, content).await {
            Ok(url) => url,
            Err(ProxyError::Rejected { status, body }) => {
                tracing::error!(status, body = %body, "Upstream rejected upload");
                return Err(ApiError::upstream(
                    status,
                    format!("Upstream API error: {body}"),
                ));
            }
            Err(e) => return Err(TempdropError::from(e).into()),
        };

        let ttl = chrono::Duration::from_std(proxy.advertised_ttl())
            .unwrap_or_else(|_| chrono::Duration::zero());

        tracing::info!(file_name = %file_name, url = %url, "Upload forwarded");

        return Ok(Json(UploadResponse::single(url, Utc::now() + ttl)));
    }

    Err(ApiError::bad_request("No file attached"))
}

/// Buffer a multipart field, failing once it exceeds `limit` bytes.
async fn read_limited(mut field: Field<'_>, limit: u64) -> Result<Vec<u8>, ApiError> {
    let mut content = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        tracing::warn!("Failed to read upload: {}", e);
        ApiError::bad_request("Failed to read file")
    })? {
        if (content.len() + chunk.len()) as u64 > limit {
            return Err(TempdropError::TooLarge { limit }.into());
        }
        content.extend_from_slice(&chunk);
    }

    Ok(content)
}
