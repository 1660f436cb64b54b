//! Ephemeral file registry.
//!
//! This module holds everything that keeps track of uploaded files:
//! - Blob storage with id-derived file names
//! - The JSON metadata snapshot used to survive restarts
//! - One expiry timer per live file
//! - The registry that ties the three together

mod entry;
mod metadata;
mod registry;
mod scheduler;
mod storage;

pub use entry::{FileEntry, StoredBlob};
pub use metadata::MetadataStore;
pub use registry::{FileRegistry, RehydrateReport};
pub use scheduler::ExpiryScheduler;
pub use storage::BlobStore;

use std::time::Duration;

/// Default time-to-live of an upload (3 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Default maximum upload size (128 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 128 * 1024 * 1024;

/// Longest file extension carried over into a stored name.
pub const MAX_EXTENSION_LENGTH: usize = 16;
