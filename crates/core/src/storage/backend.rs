//! The storage capability shared by every backend.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::local::LocalBackend;
use super::object::ObjectBackend;
use crate::upload::LimitExceeded;

/// A lazy, read-once byte sequence.
pub type ByteStream<'a> = BoxStream<'a, io::Result<Bytes>>;

/// Wrap an in-memory buffer as a [`ByteStream`].
#[cfg(test)]
pub(crate) fn byte_stream(data: impl Into<Bytes>) -> ByteStream<'static> {
    use futures::StreamExt;
    futures::stream::once(futures::future::ready(Ok(data.into()))).boxed()
}

/// Drain a [`ByteStream`] into memory.
#[cfg(test)]
pub(crate) async fn collect_bytes(mut body: ByteStream<'_>) -> io::Result<Vec<u8>> {
    use futures::StreamExt;
    let mut out = Vec::new();
    while let Some(chunk) = body.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

/// Persistence for file content, addressed by opaque keys.
///
/// Implementations exist for the local filesystem and for S3-compatible
/// object stores. Callers never branch on the variant.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Persist `body` at `key`, creating intermediate structure as needed.
    ///
    /// Returns the number of bytes written. A failed store may leave partial
    /// content behind; removing it is the caller's job.
    async fn store(
        &self,
        key: &str,
        content_type: &str,
        body: ByteStream<'_>,
    ) -> Result<u64, StorageError>;

    /// Open the content at `key` for reading.
    ///
    /// Fails with `StorageError::NotFound` when nothing is stored there.
    async fn fetch(&self, key: &str) -> Result<ByteStream<'static>, StorageError>;

    /// Remove the content at `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Duplicate the content at `from` into `to`.
    ///
    /// Fails with `StorageError::NotFound` when `from` does not exist.
    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Size in bytes of the content at `key`.
    async fn size(&self, key: &str) -> Result<u64, StorageError>;
}

/// Build the backend selected by `config`.
///
/// # Errors
///
/// Returns `StorageError::Configuration` if the provider is invalid or its
/// client cannot be initialized.
pub fn build_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    config.validate()?;
    match &config.provider {
        StorageProvider::LocalFs { root } => Ok(Arc::new(LocalBackend::new(root.clone())?)),
        provider @ StorageProvider::S3 { .. } => {
            Ok(Arc::new(ObjectBackend::from_provider(provider)?))
        }
    }
}

/// Reject keys that could escape the backend root.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.ends_with('/') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Errors coming out of the incoming body keep their size-limit meaning.
pub(crate) fn map_body_error(key: &str, err: io::Error) -> StorageError {
    match err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<LimitExceeded>())
    {
        Some(limit) => StorageError::FileTooLarge { max: limit.max },
        None => StorageError::write_failure(key, err),
    }
}
