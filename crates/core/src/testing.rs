//! Shared fixtures for the crate's tests.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use opendal::{Operator, services};
use tempfile::TempDir;
use uuid::Uuid;

use crate::download::DownloadHandler;
use crate::item::{Actor, Item, ItemEngine, ItemError, MemoryItemEngine, NewItem};
use crate::lifecycle::{FileLifecycleHooks, LifecycleDispatcher};
use crate::storage::{
    ByteStream, LocalBackend, ObjectBackend, StorageBackend, StorageConfig, StorageError,
    StorageProvider, byte_stream,
};
use crate::upload::{IncomingFile, UploadPipeline};

/// Which backend variant a test runs against.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BackendKind {
    Local,
    Object,
}

/// Backend wrapper counting calls, with optional failure injection.
pub(crate) struct RecordingBackend {
    inner: Arc<dyn StorageBackend>,
    pub stores: AtomicUsize,
    pub fetches: AtomicUsize,
    pub deletes: AtomicUsize,
    pub copies: AtomicUsize,
    /// Keys passed to `store`, in call order.
    pub stored_keys: Mutex<Vec<String>>,
    /// Destination keys passed to `copy`, in call order.
    pub copy_targets: Mutex<Vec<String>>,
    /// Write the content, then report failure.
    pub fail_store: bool,
    pub fail_delete: bool,
}

impl RecordingBackend {
    pub fn new(inner: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner,
            stores: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            copies: AtomicUsize::new(0),
            stored_keys: Mutex::default(),
            copy_targets: Mutex::default(),
            fail_store: false,
            fail_delete: false,
        }
    }

    pub fn calls(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
            + self.fetches.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
            + self.copies.load(Ordering::SeqCst)
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.inner.size(key).await.is_ok()
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.stored_keys.lock().unwrap().clone()
    }

    pub fn copy_targets(&self) -> Vec<String> {
        self.copy_targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn store(
        &self,
        key: &str,
        content_type: &str,
        body: ByteStream<'_>,
    ) -> Result<u64, StorageError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.stored_keys.lock().unwrap().push(key.to_string());
        let size = self.inner.store(key, content_type, body).await?;
        if self.fail_store {
            return Err(StorageError::write_failure(key, "disk full"));
        }
        Ok(size)
    }

    async fn fetch(&self, key: &str) -> Result<ByteStream<'static>, StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(StorageError::operation("backend unavailable"));
        }
        self.inner.delete(key).await
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        self.copy_targets.lock().unwrap().push(to.to_string());
        self.inner.copy(from, to).await
    }

    async fn size(&self, key: &str) -> Result<u64, StorageError> {
        self.inner.size(key).await
    }
}

/// Item engine that refuses to create anything.
pub(crate) struct RejectingItems;

#[async_trait]
impl ItemEngine for RejectingItems {
    async fn create_item(
        &self,
        _actor: &Actor,
        _data: NewItem,
        _parent_id: Option<Uuid>,
    ) -> Result<Item, ItemError> {
        Err(ItemError::engine("item store unavailable"))
    }

    async fn get_item(&self, id: Uuid) -> Result<Item, ItemError> {
        Err(ItemError::NotFound(id))
    }

    async fn get_public_item(&self, id: Uuid) -> Result<Item, ItemError> {
        Err(ItemError::NotFound(id))
    }
}

/// A backend, engine and owner wired the way the server wires them.
pub(crate) struct Harness {
    pub config: StorageConfig,
    pub backend: Arc<RecordingBackend>,
    pub engine: Arc<MemoryItemEngine>,
    pub owner: Actor,
    _dir: Option<TempDir>,
}

impl Harness {
    pub fn new(kind: BackendKind) -> Self {
        Self::build(kind, |config| config, |backend| backend)
    }

    pub fn build(
        kind: BackendKind,
        configure: impl FnOnce(StorageConfig) -> StorageConfig,
        wrap: impl FnOnce(RecordingBackend) -> RecordingBackend,
    ) -> Self {
        let (config, inner, dir): (StorageConfig, Arc<dyn StorageBackend>, Option<TempDir>) =
            match kind {
                BackendKind::Local => {
                    let dir = TempDir::new().expect("temp dir");
                    let config = StorageConfig::new(StorageProvider::local_fs(dir.path()));
                    let backend: Arc<dyn StorageBackend> =
                        Arc::new(LocalBackend::new(dir.path()).expect("local backend"));
                    (config, backend, Some(dir))
                }
                BackendKind::Object => {
                    let operator = Operator::new(services::Memory::default())
                        .expect("memory operator")
                        .finish();
                    let config = StorageConfig::new(StorageProvider::s3(
                        "us-east-1",
                        "bucket",
                        "key",
                        "secret",
                    ));
                    let backend: Arc<dyn StorageBackend> =
                        Arc::new(ObjectBackend::from_operator(operator));
                    (config, backend, None)
                }
            };
        let config = configure(config);
        let backend = Arc::new(wrap(RecordingBackend::new(inner)));

        let hooks = FileLifecycleHooks::new(
            backend.clone(),
            config.file_type(),
            config.path_prefix.clone(),
        );
        let engine = MemoryItemEngine::new(LifecycleDispatcher::new().with_hook(Arc::new(hooks)))
            .with_quota(config.file_type(), config.quota_bytes);

        Self {
            config,
            backend,
            engine: Arc::new(engine),
            owner: Actor::new(Uuid::new_v4()),
            _dir: dir,
        }
    }

    pub fn pipeline(&self) -> UploadPipeline {
        UploadPipeline::new(
            &self.config,
            self.backend.clone(),
            self.engine.clone(),
            self.engine.clone(),
        )
        .with_limiter(self.engine.clone())
    }

    pub fn downloads(&self) -> DownloadHandler {
        DownloadHandler::new(
            self.backend.clone(),
            self.engine.clone(),
            self.engine.clone(),
            self.config.file_type(),
        )
    }
}

pub(crate) fn incoming(filename: &str, mimetype: &str, content: &'static [u8]) -> IncomingFile<'static> {
    IncomingFile {
        filename: filename.to_string(),
        mimetype: mimetype.to_string(),
        encoding: None,
        body: byte_stream(content),
    }
}
