//! Router configuration for the HTTP API.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{delete_file, download, list_files, upload, upload_proxy, AppState};
use super::middleware::{create_cors_layer, security_headers};
use crate::config::WebConfig;

/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create the main router.
///
/// Mounts the API routes, `/health`, and (when enabled and present) the
/// static client as the fallback.
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let body_limit = usize::try_from(app_state.registry.max_upload_size())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let api_routes = Router::new()
        .route("/upload", post(upload))
        .route("/upload-uguu", post(upload_proxy))
        .route("/file/:id", get(download))
        .route("/admin/files", get(list_files))
        .route("/admin/file/:id", delete(delete_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(security_headers))
        .with_state(app_state);

    let mut router = api_routes.merge(create_health_router());

    if config.serve_static {
        if let Some(static_router) = create_static_router(&config.static_path) {
            router = router.merge(static_router);
        }
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&config.cors_origins)),
    )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Serve the browser client from `path`.
///
/// Returns `None` if the directory does not exist.
pub fn create_static_router(path: impl AsRef<Path>) -> Option<Router> {
    let path = path.as_ref();
    if !path.is_dir() {
        tracing::warn!(path = %path.display(), "Static directory not found, not serving client");
        return None;
    }

    tracing::info!(path = %path.display(), "Serving static client");
    Some(Router::new().fallback_service(ServeDir::new(path)))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
