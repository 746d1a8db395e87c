//! Member item routes.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::files;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the member item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items/upload",
            // Per-file and per-request limits are enforced while streaming.
            post(upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/items/{id}/download", get(download))
        .route("/items", post(create_folder))
        .route("/items/{id}", delete(delete_item))
        .route("/items/{id}/copy", post(copy_item))
        .route("/items/{id}/publish", post(publish_item))
}

// ============================================================================
// Request Types
// ============================================================================

/// Target folder of an upload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    /// Parent folder, or the root when absent.
    pub parent_id: Option<Uuid>,
}

/// Request body for creating a folder.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Request body for copying an item.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyItemRequest {
    /// Destination folder, or the root when absent.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/items/upload?parentId=`
async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    files::upload(&state, &auth.requester(), query.parent_id, multipart).await
}

/// GET `/items/{id}/download`
async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    files::download(&state, &auth.requester(), id).await
}

/// POST `/items`
async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateFolderRequest>,
) -> Result<Response, ApiError> {
    let folder = state
        .engine
        .create_folder(&auth.actor(), &request.name, request.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)).into_response())
}

/// DELETE `/items/{id}`
async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let removed = state.engine.delete_item(&auth.actor(), id).await?;
    info!(item_id = %id, count = removed.len(), "item deleted via api");
    Ok((StatusCode::OK, Json(json!({ "deleted": removed.len() }))).into_response())
}

/// POST `/items/{id}/copy`
async fn copy_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CopyItemRequest>,
) -> Result<Response, ApiError> {
    let copy = state
        .engine
        .copy_item(&auth.actor(), id, request.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(copy)).into_response())
}

/// POST `/items/{id}/publish`
async fn publish_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    // Publishing needs the same right as deleting.
    state.engine.require_admin(&auth.actor(), id)?;
    state.engine.publish(id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
