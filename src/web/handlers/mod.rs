//! API handlers.

pub mod admin;
pub mod file;
pub mod proxy;
pub mod upload;

pub use admin::*;
pub use file::*;
pub use proxy::*;
pub use upload::*;

use std::sync::Arc;

use crate::file::FileRegistry;
use crate::proxy::UploadProxy;

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "files[]";

/// Shared state for all handlers.
pub struct AppState {
    /// The file registry.
    pub registry: Arc<FileRegistry>,
    /// Public URL prefix for download links.
    pub base_url: String,
    /// Upstream upload proxy, `None` when disabled.
    pub proxy: Option<UploadProxy>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(registry: Arc<FileRegistry>, base_url: impl Into<String>) -> Self {
        Self {
            registry,
            base_url: base_url.into(),
            proxy: None,
        }
    }

    /// Enable the upload proxy.
    pub fn with_proxy(mut self, proxy: UploadProxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Public download URL for `id`.
    pub fn file_url(&self, id: &str) -> String {
        format!("{}/file/{}", self.base_url.trim_end_matches('/'), id)
    }
}
