//! The file registry.
//!
//! The registry is the single in-memory source of truth for live uploads.
//! One `RwLock` guards the entry map; every mutation (insert, delete, timer
//! arm/cancel, snapshot write) happens under its write half, so readers
//! never observe an entry without its blob or timer.
//!
//! Invariant: an id is in the map iff its blob is on disk and its expiry
//! timer is armed. Deletion is idempotent, so an explicit delete racing a
//! timer fire is harmless: whoever takes the write lock second finds
//! nothing to do.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::Stream;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use super::entry::{FileEntry, StoredBlob};
use super::metadata::MetadataStore;
use super::scheduler::ExpiryScheduler;
use super::storage::BlobStore;
use crate::{Result, TempdropError};

/// Outcome of startup reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RehydrateReport {
    /// Entries restored and re-armed.
    pub kept: usize,
    /// Entries dropped because they had already expired.
    pub expired: usize,
    /// Entries dropped because their blob was gone.
    pub missing: usize,
    /// Entries dropped because their path or id was not acceptable.
    pub rejected: usize,
}

/// In-memory index of live uploads.
#[derive(Debug)]
pub struct FileRegistry {
    entries: RwLock<HashMap<String, FileEntry>>,
    storage: BlobStore,
    metadata: MetadataStore,
    scheduler: ExpiryScheduler,
    ttl: Duration,
}

impl FileRegistry {
    /// Build the registry and restore it from the metadata snapshot.
    ///
    /// Expired entries and entries whose blob is missing are dropped; the
    /// rest are re-armed with their remaining time. Must be called from
    /// within a tokio runtime, before the service accepts requests.
    pub async fn open(storage: BlobStore, metadata: MetadataStore, ttl: Duration) -> Arc<Self> {
        let (scheduler, fired) = ExpiryScheduler::new();
        let registry = Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            storage,
            metadata,
            scheduler,
            ttl,
        });

        Self::spawn_reaper(Arc::downgrade(&registry), fired);

        let report = registry.rehydrate().await;
        info!(
            kept = report.kept,
            expired = report.expired,
            missing = report.missing,
            rejected = report.rejected,
            "Loaded files from metadata"
        );

        registry
    }

    /// Consume fired timers and delete the corresponding entries.
    ///
    /// Holds only a weak reference so dropping the registry stops the task.
    fn spawn_reaper(registry: Weak<Self>, mut fired: mpsc::UnboundedReceiver<String>) {
        tokio::spawn(async move {
            while let Some(id) = fired.recv().await {
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                if registry.remove(&id).await {
                    info!(id = %id, "File expired and deleted");
                }
            }
        });
    }

    /// Configured time-to-live for new uploads.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.storage.max_size()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether there are no live entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Whether `id` currently has an armed expiry timer.
    pub fn is_armed(&self, id: &str) -> bool {
        self.scheduler.is_armed(id)
    }

    /// Store an uploaded byte stream and register it with the default TTL.
    ///
    /// If the write or the registration fails, the blob is removed and no
    /// entry is created.
    pub async fn upload<S, B, E>(
        self: &Arc<Self>,
        stream: S,
        original_name: &str,
    ) -> Result<FileEntry>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let blob = self.storage.put(stream, original_name).await?;
        self.create(blob, original_name, self.ttl).await
    }

    /// Register a stored blob, expiring `ttl` from now.
    ///
    /// On error the blob is dropped, which removes it from disk. The
    /// registration runs on its own task, so dropping the returned future
    /// cannot leave an entry registered without its snapshot write.
    pub async fn create(
        self: &Arc<Self>,
        blob: StoredBlob,
        original_name: &str,
        ttl: Duration,
    ) -> Result<FileEntry> {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| TempdropError::Validation(format!("ttl out of range: {ttl:?}")))?;
        let entry = FileEntry::new(&blob, original_name, expires_at);

        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.register(blob, entry).await })
            .await
            .map_err(|e| TempdropError::StorageWrite(format!("registration task failed: {e}")))?
    }

    async fn register(&self, blob: StoredBlob, entry: FileEntry) -> Result<FileEntry> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.id) {
            return Err(TempdropError::StorageWrite(format!(
                "duplicate file id {}",
                entry.id
            )));
        }

        self.scheduler.arm(&entry.id, entry.expires_at);
        entries.insert(entry.id.clone(), entry.clone());
        blob.keep();

        self.persist(&entries).await;

        info!(
            id = %entry.id,
            original_name = %entry.original_name,
            expires_at = %entry.expires_at.to_rfc3339(),
            "File registered"
        );

        Ok(entry)
    }

    /// Look up a live entry. Does not extend its lifetime.
    ///
    /// An entry whose expiry has passed is reported as not found even if
    /// its timer has not been processed yet.
    pub async fn lookup(&self, id: &str) -> Result<FileEntry> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|entry| !entry.is_expired_at(Utc::now()))
            .cloned()
            .ok_or_else(|| TempdropError::NotFound(format!("file {id}")))
    }

    /// Look up a live entry and open its blob.
    ///
    /// The read lock is held while opening, so a concurrent delete cannot
    /// remove the blob between the lookup and the open.
    pub async fn open_blob(&self, id: &str) -> Result<(FileEntry, tokio::fs::File)> {
        let entries = self.entries.read().await;
        let entry = entries
            .get(id)
            .filter(|entry| !entry.is_expired_at(Utc::now()))
            .cloned()
            .ok_or_else(|| TempdropError::NotFound(format!("file {id}")))?;

        match self.storage.open(&entry.storage_path).await {
            Ok(file) => Ok((entry, file)),
            Err(e @ TempdropError::NotFound(_)) => {
                warn!(id = %id, "Registered file has no blob on disk");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete an entry and its blob.
    ///
    /// Idempotent: returns `false` if `id` was not registered.
    pub async fn delete(&self, id: &str) -> bool {
        let deleted = self.remove(id).await;
        if deleted {
            info!(id = %id, "File deleted");
        }
        deleted
    }

    async fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.remove(id) else {
            return false;
        };

        self.scheduler.cancel(id);

        match self.storage.remove(&entry.storage_path).await {
            Ok(true) => {}
            Ok(false) => debug!(id = %id, "Blob already gone"),
            Err(e) => warn!(id = %id, error = %e, "Failed to remove blob"),
        }

        self.persist(&entries).await;
        true
    }

    /// All live entries, soonest expiry first.
    ///
    /// Entries past their expiry are left out even if their timer has not
    /// been processed yet, matching [`FileRegistry::lookup`].
    pub async fn list_all(&self) -> Vec<FileEntry> {
        let entries = self.entries.read().await;
        let now = Utc::now();
        let mut list = sorted(&entries);
        list.retain(|entry| !entry.is_expired_at(now));
        list
    }

    /// Reconcile the registry with the metadata snapshot.
    ///
    /// Called by [`FileRegistry::open`]; safe to call again, since restored
    /// entries simply replace their in-memory counterparts and timers.
    pub async fn rehydrate(&self) -> RehydrateReport {
        let loaded = self.metadata.load_all().await;
        let now = Utc::now();
        let mut report = RehydrateReport::default();

        let mut entries = self.entries.write().await;
        for entry in loaded {
            if !self.storage.owns(&entry) {
                warn!(id = %entry.id, path = %entry.storage_path.display(), "Rejecting snapshot entry outside storage");
                report.rejected += 1;
                continue;
            }

            if entry.is_expired_at(now) {
                // The timer would have removed it had the process been up.
                if let Err(e) = self.storage.remove(&entry.storage_path).await {
                    warn!(id = %entry.id, error = %e, "Failed to remove expired blob");
                }
                report.expired += 1;
                continue;
            }

            if !self.storage.exists(&entry.storage_path).await {
                report.missing += 1;
                continue;
            }

            debug!(
                id = %entry.id,
                remaining_secs = entry.remaining_at(now).as_secs(),
                "Restoring file"
            );
            self.scheduler.arm(&entry.id, entry.expires_at);
            entries.insert(entry.id.clone(), entry);
            report.kept += 1;
        }

        self.persist(&entries).await;
        drop(entries);

        if let Err(e) = self.storage.cleanup_empty_dirs().await {
            debug!(error = %e, "Shard cleanup failed");
        }

        report
    }

    /// Flush the snapshot and stop all timers.
    ///
    /// Files stay on disk; they are re-armed on the next start.
    pub async fn shutdown(&self) {
        let entries = self.entries.write().await;
        self.scheduler.cancel_all();
        self.persist(&entries).await;
        info!(files = entries.len(), "Registry shut down");
    }

    /// Best-effort snapshot write; failures are logged.
    async fn persist(&self, entries: &HashMap<String, FileEntry>) {
        if let Err(e) = self.metadata.save_all(&sorted(entries)).await {
            error!(
                error = %e,
                path = %self.metadata.path().display(),
                "Failed to write metadata snapshot"
            );
        }
    }
}

fn sorted(entries: &HashMap<String, FileEntry>) -> Vec<FileEntry> {
    let mut list: Vec<FileEntry> = entries.values().cloned().collect();
    list.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then_with(|| a.id.cmp(&b.id)));
    list
}
