//! Retrieval of stored file content.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::FileItemError;
use crate::item::{FileItemType, ItemEngine, MembershipEngine, Requester};
use crate::storage::{ByteStream, StorageBackend};

/// A file ready to be sent to the client.
pub struct FileDownload {
    /// Original file name.
    pub name: String,
    /// MIME type.
    pub mimetype: String,
    /// Size in bytes as recorded at upload.
    pub size: u64,
    /// File content.
    pub body: ByteStream<'static>,
}

impl FileDownload {
    /// `Content-Disposition` header value naming the original file.
    #[must_use]
    pub fn content_disposition(&self) -> String {
        content_disposition(&self.name)
    }
}

impl std::fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDownload")
            .field("name", &self.name)
            .field("mimetype", &self.mimetype)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Resolves a file item and opens its content.
pub struct DownloadHandler {
    backend: Arc<dyn StorageBackend>,
    items: Arc<dyn ItemEngine>,
    memberships: Arc<dyn MembershipEngine>,
    file_type: FileItemType,
}

impl DownloadHandler {
    /// Create a handler for items of `file_type` stored in `backend`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        items: Arc<dyn ItemEngine>,
        memberships: Arc<dyn MembershipEngine>,
        file_type: FileItemType,
    ) -> Self {
        Self {
            backend,
            items,
            memberships,
            file_type,
        }
    }

    /// Open the content of item `id` for `requester`.
    ///
    /// Members need read permission. Public requesters only see items the
    /// engine exposes publicly.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` / `NotFound` from the item lookup
    /// - `InvalidItem` if the item is not a file item of the configured type;
    ///   storage is not touched in that case
    /// - `NotFound` if the stored content is missing
    pub async fn download(
        &self,
        requester: &Requester,
        id: Uuid,
    ) -> Result<FileDownload, FileItemError> {
        let item = match requester {
            Requester::Member(actor) => {
                self.memberships.can_read(actor, id).await?;
                self.items.get_item(id).await?
            }
            Requester::Public => self.items.get_public_item(id).await?,
        };

        let Some(extra) = item.file_extra(self.file_type) else {
            debug!(item_id = %id, item_type = %item.item_type, "download of non-file item");
            return Err(FileItemError::InvalidItem(id));
        };

        let body = self.backend.fetch(&extra.path).await?;
        info!(item_id = %id, path = %extra.path, size = extra.size, "serving file");
        Ok(FileDownload {
            name: extra.name,
            mimetype: extra.mimetype,
            size: extra.size,
            body,
        })
    }
}

impl std::fmt::Debug for DownloadHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadHandler")
            .field("backend", &self.backend.name())
            .field("file_type", &self.file_type)
            .finish_non_exhaustive()
    }
}

/// `Content-Disposition: attachment` value for `name`.
///
/// Plain ASCII names are quoted as-is. Other names get an ASCII fallback
/// plus an RFC 5987 `filename*` parameter.
#[must_use]
pub fn content_disposition(name: &str) -> String {
    let plain = name
        .chars()
        .all(|c| c.is_ascii_graphic() || c == ' ')
        && !name.contains(['"', '\\']);
    if plain {
        return format!("attachment; filename=\"{name}\"");
    }

    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '?',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(name)
    )
}
