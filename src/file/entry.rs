//! Registry entry types.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::storage::BlobGuard;

/// One live uploaded file.
///
/// The serialized form is shared by the metadata snapshot and the admin
/// listing: `{ id, filename, originalName, path, expiresAt }` with
/// `expiresAt` in Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Unique identifier, used in download URLs.
    pub id: String,
    /// Name of the blob on disk (id plus the original extension).
    #[serde(rename = "filename")]
    pub stored_name: String,
    /// Client-supplied filename. Only ever used for Content-Disposition.
    pub original_name: String,
    /// Resolved location of the blob.
    #[serde(rename = "path")]
    pub storage_path: PathBuf,
    /// Absolute expiry time; fixed at creation.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl FileEntry {
    /// Create an entry for a stored blob.
    pub fn new(
        blob: &StoredBlob,
        original_name: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: blob.id.clone(),
            stored_name: blob.stored_name.clone(),
            original_name: original_name.into(),
            storage_path: blob.path.clone(),
            expires_at,
        }
    }

    /// Whether the entry has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left until expiry, zero if already expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// A blob that has been fully written but not yet registered.
///
/// Dropping a `StoredBlob` without registering it removes the file, so an
/// upload that fails (or is cancelled) after the write never leaves an
/// orphan behind.
#[derive(Debug)]
pub struct StoredBlob {
    /// Freshly generated identifier.
    pub id: String,
    /// `{id}.{ext}` or just `{id}` when the original had no usable extension.
    pub stored_name: String,
    /// Full path of the blob.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
    guard: BlobGuard,
}

impl StoredBlob {
    pub(crate) fn new(
        id: String,
        stored_name: String,
        path: PathBuf,
        size: u64,
        guard: BlobGuard,
    ) -> Self {
        Self {
            id,
            stored_name,
            path,
            size,
            guard,
        }
    }

    /// Keep the file on disk; ownership passes to the registry.
    pub(crate) fn keep(mut self) {
        self.guard.disarm();
    }
}
