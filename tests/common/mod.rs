//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use futures::{stream, Stream};
use tempfile::TempDir;

use tempdrop::config::WebConfig;
use tempdrop::file::{BlobStore, FileEntry, FileRegistry, MetadataStore, DEFAULT_MAX_FILE_SIZE};
use tempdrop::web::handlers::AppState;
use tempdrop::web::router::create_router;
use tempdrop::UploadProxy;

/// Base URL used for download links in tests.
pub const BASE_URL: &str = "http://files.test";

/// A registry backed by a temporary directory.
pub struct TestRegistry {
    pub dir: TempDir,
    pub registry: Arc<FileRegistry>,
}

impl TestRegistry {
    /// Open a registry with the given TTL and the default size limit.
    pub async fn new(ttl: Duration) -> Self {
        Self::with_limit(ttl, DEFAULT_MAX_FILE_SIZE).await
    }

    /// Open a registry with the given TTL and size limit.
    pub async fn with_limit(ttl: Duration, max_size: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let registry = open_registry(&dir, ttl, max_size).await;
        Self { dir, registry }
    }

    /// Open a second registry over the same directories, as after a restart.
    pub async fn reopen(&self, ttl: Duration) -> Arc<FileRegistry> {
        open_registry(&self.dir, ttl, DEFAULT_MAX_FILE_SIZE).await
    }

    pub fn storage_path(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.path().join("metadata.json")
    }

    /// Upload `content` under `name`.
    pub async fn upload(&self, name: &str, content: &[u8]) -> FileEntry {
        upload_bytes(&self.registry, name, content).await
    }
}

pub async fn open_registry(dir: &TempDir, ttl: Duration, max_size: u64) -> Arc<FileRegistry> {
    let storage = BlobStore::new(dir.path().join("uploads"), max_size).unwrap();
    let metadata = MetadataStore::new(dir.path().join("metadata.json"));
    FileRegistry::open(storage, metadata, ttl).await
}

/// A single-chunk upload body.
pub fn chunks(content: &[u8]) -> impl Stream<Item = std::io::Result<Vec<u8>>> {
    stream::iter(vec![Ok(content.to_vec())])
}

pub async fn upload_bytes(registry: &Arc<FileRegistry>, name: &str, content: &[u8]) -> FileEntry {
    registry.upload(chunks(content), name).await.unwrap()
}

/// Web configuration with static hosting off.
pub fn web_config() -> WebConfig {
    WebConfig {
        cors_origins: vec![],
        serve_static: false,
        static_path: "public".to_string(),
    }
}

/// Build a test server over `registry`, optionally with the upload proxy.
pub fn test_server(registry: Arc<FileRegistry>, proxy: Option<UploadProxy>) -> TestServer {
    let mut state = AppState::new(registry, BASE_URL);
    if let Some(proxy) = proxy {
        state = state.with_proxy(proxy);
    }

    let router = create_router(Arc::new(state), &web_config());
    TestServer::new(router).expect("Failed to create test server")
}

/// Id at the end of a download URL.
pub fn id_from_url(url: &str) -> String {
    url.rsplit('/').next().unwrap().to_string()
}

/// Every regular file under `dir`, recursively.
pub fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(walk_files(&path));
            } else {
                files.push(path);
            }
        }
    }
    files
}
