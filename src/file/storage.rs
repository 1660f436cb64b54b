//! Blob storage for tempdrop.
//!
//! This module provides physical file storage functionality:
//! - UUID-based file naming; the client's filename never reaches the disk
//! - Directory sharding by first 2 characters of the UUID
//! - Streaming writes with a size limit, open, and idempotent removal

use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::entry::{FileEntry, StoredBlob};
use super::MAX_EXTENSION_LENGTH;
use crate::{Result, TempdropError};

/// Blob store for uploaded files.
///
/// Files are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.txt
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Canonical base directory for blob storage.
    base_path: PathBuf,
    /// Maximum size of a single blob in bytes.
    max_size: u64,
}

impl BlobStore {
    /// Create a new BlobStore rooted at `base_path`.
    ///
    /// The base directory will be created if it doesn't exist and is
    /// canonicalized so stored paths are fully resolved.
    pub fn new(base_path: impl Into<PathBuf>, max_size: u64) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        let base_path = std::fs::canonicalize(&base_path)?;

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Maximum accepted blob size in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Write a byte stream to a fresh blob.
    ///
    /// A new id is generated and the stored name is derived from the id and
    /// the extension of `original_name` only. The partially written file is
    /// removed if the stream fails, the size limit is exceeded, or the
    /// returned future is dropped before completion.
    pub async fn put<S, B, E>(&self, stream: S, original_name: &str) -> Result<StoredBlob>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let id = Uuid::new_v4().to_string();
        let stored_name = Self::stored_name(&id, original_name);
        let path = self.get_file_path(&stored_name);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(&path, e))?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| write_error(&path, e))?;
        let guard = BlobGuard::new(path.clone());

        let mut stream = std::pin::pin!(stream);
        let mut size: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                TempdropError::Validation(format!("failed to read upload: {e}"))
            })?;
            let chunk = chunk.as_ref();

            size += chunk.len() as u64;
            if size > self.max_size {
                return Err(TempdropError::TooLarge {
                    limit: self.max_size,
                });
            }

            file.write_all(chunk)
                .await
                .map_err(|e| write_error(&path, e))?;
        }

        file.flush().await.map_err(|e| write_error(&path, e))?;
        drop(file);

        tracing::debug!(id = %id, size, path = %path.display(), "Blob written");

        Ok(StoredBlob::new(id, stored_name, path, size, guard))
    }

    /// Open a stored blob for reading.
    pub async fn open(&self, path: &Path) -> Result<fs::File> {
        match fs::File::open(path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(TempdropError::NotFound(format!("blob {}", path.display())))
            }
            Err(e) => Err(TempdropError::StorageRead(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    /// Delete a blob.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub async fn remove(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists.
    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Whether an entry's blob lives inside this store.
    ///
    /// Snapshot contents are untrusted on load; an entry that fails this
    /// check must never be read or deleted through the store. Both the
    /// sharded layout and flat `{base}/{name}` files are accepted.
    pub fn owns(&self, entry: &FileEntry) -> bool {
        let path = &entry.storage_path;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }

        match path.parent().map(std::fs::canonicalize) {
            Some(Ok(parent)) => parent.starts_with(&self.base_path),
            _ => false,
        }
    }

    /// Get the full file path for a stored name.
    ///
    /// The path is constructed as: {base_path}/{shard}/{stored_name}
    /// where shard is the first 2 characters of the stored name (UUID prefix).
    pub fn get_file_path(&self, stored_name: &str) -> PathBuf {
        self.base_path
            .join(Self::get_shard(stored_name))
            .join(stored_name)
    }

    /// Get the shard directory name for a stored name.
    fn get_shard(stored_name: &str) -> &str {
        stored_name.get(..2).unwrap_or(stored_name)
    }

    /// Extract a storage-safe extension from a client filename.
    ///
    /// Only short ASCII alphanumeric extensions are kept.
    fn extract_extension(filename: &str) -> Option<&str> {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LENGTH
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
    }

    /// Build the stored name for an id and a client filename.
    fn stored_name(id: &str, original_name: &str) -> String {
        match Self::extract_extension(original_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        }
    }

    /// Clean up empty shard directories.
    pub async fn cleanup_empty_dirs(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let mut children = fs::read_dir(&path).await?;
            if children.next_entry().await?.is_none() && fs::remove_dir(&path).await.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

fn write_error(path: &Path, e: io::Error) -> TempdropError {
    TempdropError::StorageWrite(format!("{}: {e}", path.display()))
}

/// Removes a blob file on drop unless disarmed.
#[derive(Debug)]
pub(crate) struct BlobGuard {
    path: PathBuf,
    armed: bool,
}

impl BlobGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for BlobGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed unregistered blob"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove unregistered blob"
            ),
        }
    }
}
