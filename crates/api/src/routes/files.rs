//! Multipart ingestion and download responses shared by member and public
//! routes.

use std::io;

use axum::{
    Json,
    body::Body,
    extract::multipart::{Multipart, MultipartError},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use futures::{StreamExt, TryStreamExt};
use tracing::debug;
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use fileitem_core::item::Requester;
use fileitem_core::upload::{IncomingFile, UploadOutcome};
use fileitem_shared::AppError;

const DEFAULT_MIMETYPE: &str = "application/octet-stream";
const TRANSFER_ENCODING_HEADER: &str = "content-transfer-encoding";

fn multipart_error(err: MultipartError) -> ApiError {
    AppError::Validation(err.body_text()).into()
}

/// Stream every file part of `multipart` through the upload pipeline.
///
/// Parts without a filename are skipped. Responds `201` with the item for a
/// single file and `204` for several.
pub(super) async fn upload(
    state: &AppState,
    requester: &Requester,
    parent_id: Option<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut session = state.uploads.begin(requester, parent_id).await?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(filename) = field.file_name().map(str::to_owned) else {
            debug!(field = ?field.name(), "skipping non-file field");
            continue;
        };
        let mimetype = field.content_type().unwrap_or(DEFAULT_MIMETYPE).to_owned();
        let encoding = field
            .headers()
            .get(TRANSFER_ENCODING_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = field.map_err(io::Error::other).boxed();

        session
            .ingest(IncomingFile {
                filename,
                mimetype,
                encoding,
                body,
            })
            .await?;
    }

    match session.finish()? {
        UploadOutcome::Created(item) => Ok((StatusCode::CREATED, Json(item)).into_response()),
        UploadOutcome::Accepted { .. } => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Stream the content of item `id` with its name and type.
pub(super) async fn download(
    state: &AppState,
    requester: &Requester,
    id: Uuid,
) -> Result<Response, ApiError> {
    let file = state.downloads.download(requester, id).await?;
    let headers = [
        (CONTENT_TYPE, file.mimetype.clone()),
        (CONTENT_DISPOSITION, file.content_disposition()),
    ];
    Ok((headers, Body::from_stream(file.body)).into_response())
}
