//! Local filesystem backend, on OpenDAL's `fs` service.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opendal::services;

use super::backend::{ByteStream, StorageBackend};
use super::error::StorageError;
use super::operator::OperatorStore;

/// Stores each key as a file under a root directory.
///
/// Key segments map to nested directories: `a1b2/c3d4/e5f6-1` becomes
/// `{root}/a1b2/c3d4/e5f6-1`.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    store: OperatorStore,
}

impl LocalBackend {
    /// Create a backend rooted at `root`. A missing root directory is created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if the root is not valid UTF-8
    /// or the filesystem service cannot be initialized.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        let builder = services::Fs::default().root(
            root.to_str()
                .ok_or_else(|| StorageError::configuration("local root is not valid UTF-8"))?,
        );
        Ok(Self {
            store: OperatorStore::from_builder(builder)?,
            root,
        })
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn store(
        &self,
        key: &str,
        content_type: &str,
        body: ByteStream<'_>,
    ) -> Result<u64, StorageError> {
        self.store.store(key, content_type, body).await
    }

    async fn fetch(&self, key: &str) -> Result<ByteStream<'static>, StorageError> {
        self.store.fetch(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(key).await
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.store.copy(from, to).await
    }

    async fn size(&self, key: &str) -> Result<u64, StorageError> {
        self.store.size(key).await
    }
}
