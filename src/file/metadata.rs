//! Metadata snapshot for the file registry.
//!
//! The snapshot is a pretty-printed JSON array of [`FileEntry`] objects. It
//! is rewritten in full after every registry mutation and read once at
//! startup. Writes go through a sibling temporary file followed by a rename,
//! so a crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use tokio::fs;

use super::entry::FileEntry;
use crate::{Result, TempdropError};

/// Durable mirror of the registry's entries.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Create a store backed by the snapshot file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "metadata.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Overwrite the snapshot with `entries`.
    pub async fn save_all(&self, entries: &[FileEntry]) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| TempdropError::StorageWrite(format!("snapshot encode: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, &json).await?;
        fs::rename(&temp_path, &self.path).await?;

        tracing::trace!(entries = entries.len(), path = %self.path.display(), "Snapshot written");
        Ok(())
    }

    /// Read the snapshot.
    ///
    /// A missing snapshot yields `Ok(vec![])`; an unreadable or malformed
    /// one yields [`TempdropError::MetadataCorrupt`].
    pub async fn try_load(&self) -> Result<Vec<FileEntry>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TempdropError::MetadataCorrupt(format!(
                    "{}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_slice(&content).map_err(|e| {
            TempdropError::MetadataCorrupt(format!("{}: {e}", self.path.display()))
        })
    }

    /// Read the snapshot, treating any failure as an empty snapshot.
    pub async fn load_all(&self) -> Vec<FileEntry> {
        match self.try_load().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable metadata snapshot");
                Vec::new()
            }
        }
    }
}
