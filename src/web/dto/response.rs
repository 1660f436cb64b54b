//! Response DTOs for the HTTP API.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Successful upload response.
///
/// ```json
/// { "success": true, "files": [{ "url": "...", "expiresAt": 1700000000000 }] }
/// ```
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Uploaded files. The API accepts one file per request.
    pub files: Vec<UploadedFile>,
}

impl UploadResponse {
    /// Response for a single uploaded file.
    pub fn single(url: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            files: vec![UploadedFile {
                url: url.into(),
                expires_at: expires_at.timestamp_millis(),
            }],
        }
    }
}

/// One uploaded file in an [`UploadResponse`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Download URL.
    pub url: String,
    /// Expiry as Unix epoch milliseconds.
    pub expires_at: i64,
}

/// Bare acknowledgement: `{ "success": true }`.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
}

impl SuccessResponse {
    /// Create an acknowledgement.
    pub fn ok() -> Self {
        Self { success: true }
    }
}
