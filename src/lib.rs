//! tempdrop - ephemeral file sharing
//!
//! Clients upload a file, receive a time-limited download link, and the
//! file is purged automatically once its TTL elapses. The registry of live
//! files is mirrored to a JSON snapshot so expiry survives restarts.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod proxy;
pub mod web;

pub use config::Config;
pub use error::{Result, TempdropError};
pub use file::{BlobStore, FileEntry, FileRegistry, MetadataStore};
pub use proxy::UploadProxy;
pub use web::WebServer;
