//! Administrative handlers.
//!
//! These endpoints are unauthenticated. They exist for operators and
//! debugging, not as a security boundary.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::file::FileEntry;
use crate::web::dto::SuccessResponse;

/// GET /admin/files - List all live entries.
pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<Vec<FileEntry>> {
    Json(state.registry.list_all().await)
}

/// DELETE /admin/file/:id - Delete an entry now.
///
/// Always succeeds; unknown ids are a no-op.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<SuccessResponse> {
    // Runs on its own task so a dropped connection cannot interrupt it
    // between removing the entry and removing the blob.
    let registry = state.registry.clone();
    let task_id = id.clone();
    let task = tokio::spawn(async move { registry.delete(&task_id).await });

    match task.await {
        Ok(true) => {}
        Ok(false) => tracing::debug!(id = %id, "Delete of unknown file"),
        Err(e) => tracing::error!(id = %id, error = %e, "Delete task failed"),
    }

    Json(SuccessResponse::ok())
}
