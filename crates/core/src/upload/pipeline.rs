//! Upload ingestion: stream parts into storage and register them as items.
//!
//! ```text
//! begin(requester, parent)      permission + quota, no I/O yet
//!   └─ ingest(part) × N         allocate → store → create item
//!        on failure             delete stored content, propagate
//! finish()                      NoFiles | Created(item) | Accepted{count}
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::limit::limit_stream;
use crate::error::FileItemError;
use crate::item::{
    Actor, FileExtra, FileItemType, Item, ItemEngine, MembershipEngine, NewItem, Requester,
    UploadLimiter,
};
use crate::storage::{ByteStream, StorageBackend, StorageConfig, path};

/// Maximum item name length in characters.
pub const MAX_ITEM_NAME_LENGTH: usize = 100;

/// One file part of an upload request.
pub struct IncomingFile<'a> {
    /// Original file name.
    pub filename: String,
    /// Declared MIME type.
    pub mimetype: String,
    /// Declared transfer encoding.
    pub encoding: Option<String>,
    /// File content.
    pub body: ByteStream<'a>,
}

impl std::fmt::Debug for IncomingFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingFile")
            .field("filename", &self.filename)
            .field("mimetype", &self.mimetype)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Result of a completed upload request.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Exactly one file was uploaded.
    Created(Item),
    /// Several files were uploaded.
    Accepted {
        /// Number of items created.
        count: usize,
    },
}

/// Turns uploaded file parts into stored content plus file items.
pub struct UploadPipeline {
    backend: Arc<dyn StorageBackend>,
    items: Arc<dyn ItemEngine>,
    memberships: Arc<dyn MembershipEngine>,
    limiter: Option<Arc<dyn UploadLimiter>>,
    file_type: FileItemType,
    path_prefix: String,
    max_file_size: u64,
    max_files: usize,
}

impl UploadPipeline {
    /// Create a pipeline storing into `backend` under `config`'s limits.
    #[must_use]
    pub fn new(
        config: &StorageConfig,
        backend: Arc<dyn StorageBackend>,
        items: Arc<dyn ItemEngine>,
        memberships: Arc<dyn MembershipEngine>,
    ) -> Self {
        Self {
            backend,
            items,
            memberships,
            limiter: None,
            file_type: config.file_type(),
            path_prefix: config.path_prefix.clone(),
            max_file_size: config.max_file_size,
            max_files: config.max_files,
        }
    }

    /// Consult `limiter` before accepting an upload.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<dyn UploadLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Start an upload into `parent_id` (or the root when `None`).
    ///
    /// Performs every check that does not need the file content, so a
    /// rejected upload never touches storage.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` for public requesters or without write access
    /// - `NotFound` if the parent does not exist
    /// - `QuotaExceeded` if the limiter refuses
    pub async fn begin(
        &self,
        requester: &Requester,
        parent_id: Option<Uuid>,
    ) -> Result<UploadSession<'_>, FileItemError> {
        let Requester::Member(actor) = *requester else {
            return Err(FileItemError::permission_denied("cannot edit public item"));
        };

        if let Some(parent_id) = parent_id {
            self.memberships.can_write(&actor, parent_id).await?;
        }
        if let Some(limiter) = &self.limiter {
            limiter.check(&actor, self.file_type.as_str()).await?;
        }

        debug!(member_id = %actor.id, parent_id = ?parent_id, "upload accepted");
        Ok(UploadSession {
            pipeline: self,
            actor,
            parent_id,
            created: Vec::new(),
        })
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            error!(path = key, error = %e, "failed to remove content of failed upload");
        }
    }
}

impl std::fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("backend", &self.backend.name())
            .field("file_type", &self.file_type)
            .field("path_prefix", &self.path_prefix)
            .field("max_file_size", &self.max_file_size)
            .field("max_files", &self.max_files)
            .finish_non_exhaustive()
    }
}

/// An upload in progress. Parts are ingested one at a time, in order.
#[derive(Debug)]
pub struct UploadSession<'p> {
    pipeline: &'p UploadPipeline,
    actor: Actor,
    parent_id: Option<Uuid>,
    created: Vec<Item>,
}

impl UploadSession<'_> {
    /// Store one part and create its item.
    ///
    /// If storing or item creation fails, the content written for this part
    /// is removed before the error is returned. Items created for earlier
    /// parts are kept.
    ///
    /// # Errors
    ///
    /// - `TooManyFiles` past the per-request part limit
    /// - `FileTooLarge` if the body exceeds the per-file size limit
    /// - `StorageWriteFailure` if the backend rejects the content
    /// - any item engine error from item creation
    pub async fn ingest(&mut self, file: IncomingFile<'_>) -> Result<&Item, FileItemError> {
        let pipeline = self.pipeline;
        if self.created.len() >= pipeline.max_files {
            return Err(FileItemError::TooManyFiles {
                max: pipeline.max_files,
            });
        }

        let IncomingFile {
            filename,
            mimetype,
            encoding,
            body,
        } = file;
        let key = path::allocate(&pipeline.path_prefix);
        let body = limit_stream(body, pipeline.max_file_size);

        let size = match pipeline.backend.store(&key, &mimetype, body).await {
            Ok(size) => size,
            Err(e) => {
                error!(path = %key, error = %e, "failed to store uploaded file");
                pipeline.discard(&key).await;
                return Err(FileItemError::from_store(&key, e));
            }
        };

        let extra = FileExtra {
            name: filename.clone(),
            path: key.clone(),
            mimetype,
            size,
            encoding,
        };
        let data = new_file_item(&filename, pipeline.file_type, &extra);

        match pipeline
            .items
            .create_item(&self.actor, data, self.parent_id)
            .await
        {
            Ok(item) => {
                info!(item_id = %item.id, path = %key, size, "uploaded file");
                self.created.push(item);
                self.created
                    .last()
                    .ok_or_else(|| FileItemError::Item("created item missing".to_string()))
            }
            Err(e) => {
                error!(path = %key, error = %e, "failed to create item for uploaded file");
                pipeline.discard(&key).await;
                Err(e.into())
            }
        }
    }

    /// Items created so far.
    #[must_use]
    pub fn created(&self) -> &[Item] {
        &self.created
    }

    /// Conclude the upload.
    ///
    /// # Errors
    ///
    /// Returns `NoFiles` if no part was ingested.
    pub fn finish(mut self) -> Result<UploadOutcome, FileItemError> {
        match self.created.len() {
            0 => Err(FileItemError::NoFiles),
            1 => self
                .created
                .pop()
                .map(UploadOutcome::Created)
                .ok_or(FileItemError::NoFiles),
            count => Ok(UploadOutcome::Accepted { count }),
        }
    }
}

/// Item data for an uploaded file.
fn new_file_item(filename: &str, file_type: FileItemType, extra: &FileExtra) -> NewItem {
    let mut data = NewItem::file(truncate_name(filename), file_type, extra);
    if extra.mimetype.starts_with("image/") {
        let mut settings = Map::new();
        settings.insert("hasThumbnail".to_string(), Value::Bool(true));
        data.settings = settings;
    }
    data
}

/// Item name for `filename`, cut to [`MAX_ITEM_NAME_LENGTH`] characters.
#[must_use]
pub fn truncate_name(filename: &str) -> String {
    filename.chars().take(MAX_ITEM_NAME_LENGTH).collect()
}
