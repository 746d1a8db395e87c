//! Hooks keeping stored file content in step with file items.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::dispatcher::{HookError, LifecycleHook};
use crate::item::{FileItemType, Item};
use crate::storage::{StorageBackend, path};

/// Removes content when a file item is deleted and duplicates it when a file
/// item is copied.
pub struct FileLifecycleHooks {
    backend: Arc<dyn StorageBackend>,
    file_type: FileItemType,
    path_prefix: String,
}

impl FileLifecycleHooks {
    /// Create hooks for items of `file_type` stored in `backend`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        file_type: FileItemType,
        path_prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            file_type,
            path_prefix: path_prefix.into(),
        }
    }
}

#[async_trait]
impl LifecycleHook for FileLifecycleHooks {
    fn name(&self) -> &'static str {
        "file-content"
    }

    fn handles(&self, item_type: &str) -> bool {
        item_type == self.file_type.as_str()
    }

    async fn after_delete(&self, item: &Item) -> Result<(), HookError> {
        let Some(path) = item.file_path(self.file_type) else {
            debug!(item_id = %item.id, "deleted file item has no stored content");
            return Ok(());
        };

        self.backend.delete(path).await?;
        info!(item_id = %item.id, path, "removed file content");
        Ok(())
    }

    async fn before_copy(&self, original: &Item, copy: &mut Item) -> Result<(), HookError> {
        let Some(from) = original.file_path(self.file_type) else {
            debug!(item_id = %original.id, "copied file item has no stored content");
            return Ok(());
        };

        let new_path = path::allocate(&self.path_prefix);
        self.backend.copy(from, &new_path).await?;
        info!(
            item_id = %original.id,
            from,
            to = %new_path,
            "copied file content"
        );

        copy.set_file_path(self.file_type, new_path);
        Ok(())
    }
}
