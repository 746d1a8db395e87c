//! Public item routes. Anonymous callers may download published files and
//! may never upload.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;

use super::{files, items::UploadQuery};
use crate::{AppState, error::ApiError};
use fileitem_core::item::Requester;

/// Creates the public routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/p/items/upload", post(upload))
        .route("/p/items/{id}/download", get(download))
}

/// POST `/p/items/upload`
///
/// Always refused before any part is read.
async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    files::upload(&state, &Requester::Public, query.parent_id, multipart).await
}

/// GET `/p/items/{id}/download`
async fn download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    files::download(&state, &Requester::Public, id).await
}
