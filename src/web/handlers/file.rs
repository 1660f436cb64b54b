//! Download handler.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use super::AppState;
use crate::TempdropError;

/// Plain-text body for unknown or expired ids.
pub const NOT_FOUND_BODY: &str = "File not found or has expired";

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters (CR, LF) are dropped so the name cannot inject
/// headers. Quotes and backslashes are replaced in the plain `filename`
/// parameter, and non-ASCII names get an RFC 5987 `filename*` parameter.
pub fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() => c,
            _ => '_',
        })
        .collect();

    if sanitized == filename {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let clean: String = filename.chars().filter(|c| !c.is_control()).collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(&clean)
    )
}

/// GET /file/:id - Stream a stored file under its original name.
///
/// Responds 404 with a plain-text body when the id is unknown or expired.
/// Reading does not extend the file's lifetime.
pub async fn download(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let (entry, file) = match state.registry.open_blob(&id).await {
        Ok(found) => found,
        Err(TempdropError::NotFound(_)) => {
            return (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response();
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Failed to open file");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response();
        }
    };

    let content_type = mime_guess::from_path(&entry.original_name).first_or_octet_stream();

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&entry.original_name),
        );

    match file.metadata().await {
        Ok(meta) => builder = builder.header(header::CONTENT_LENGTH, meta.len()),
        Err(e) => tracing::debug!(id = %id, error = %e, "Blob size unavailable"),
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        })
}
