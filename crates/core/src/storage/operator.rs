//! OpenDAL plumbing shared by the filesystem and object-store backends.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.writer_with(key)        │ op.copy(from, to)                  │
//! │ op.reader(key)             │ op.stat(key)                       │
//! │ op.delete(key)             │                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use futures::StreamExt;
use opendal::Operator;
use tracing::{debug, warn};

use super::backend::{ByteStream, check_key, map_body_error};
use super::error::StorageError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Key-addressed content operations over one OpenDAL operator.
#[derive(Debug, Clone)]
pub(crate) struct OperatorStore {
    operator: Operator,
}

impl OperatorStore {
    pub(crate) fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Build an operator from a service builder.
    pub(crate) fn from_builder<B: opendal::Builder>(builder: B) -> Result<Self, StorageError> {
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        Ok(Self::new(operator))
    }

    pub(crate) async fn store(
        &self,
        key: &str,
        content_type: &str,
        mut body: ByteStream<'_>,
    ) -> Result<u64, StorageError> {
        check_key(key)?;

        let capability = self.operator.info().full_capability();
        let writer = if capability.write_with_content_type {
            self.operator.writer_with(key).content_type(content_type).await
        } else {
            self.operator.writer(key).await
        };
        let mut writer = writer.map_err(|e| StorageError::write_failure(key, e))?;

        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let written = match chunk {
                Ok(chunk) => {
                    let len = chunk.len() as u64;
                    writer
                        .write(chunk)
                        .await
                        .map(|()| len)
                        .map_err(|e| StorageError::write_failure(key, e))
                }
                Err(e) => Err(map_body_error(key, e)),
            };
            match written {
                Ok(len) => size += len,
                Err(err) => {
                    if let Err(abort_err) = writer.abort().await {
                        warn!(key, error = %abort_err, "failed to abort upload");
                    }
                    return Err(err);
                }
            }
        }
        writer
            .close()
            .await
            .map_err(|e| StorageError::write_failure(key, e))?;

        debug!(key, size, content_type, "stored content");
        Ok(size)
    }

    pub(crate) async fn fetch(&self, key: &str) -> Result<ByteStream<'static>, StorageError> {
        check_key(key)?;
        self.operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;

        let reader = self
            .operator
            .reader(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        let stream = reader
            .into_bytes_stream(..)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        Ok(stream.boxed())
    }

    pub(crate) async fn delete(&self, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))
    }

    pub(crate) async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        check_key(from)?;
        check_key(to)?;

        let meta = self
            .operator
            .stat(from)
            .await
            .map_err(|e| StorageError::from_opendal(from, &e))?;

        if self.operator.info().full_capability().copy {
            self.operator
                .copy(from, to)
                .await
                .map_err(|e| StorageError::from_opendal(from, &e))
        } else {
            // Stream through for services without server-side copy.
            let content_type = meta.content_type().unwrap_or(DEFAULT_CONTENT_TYPE);
            let body = self.fetch(from).await?;
            self.store(to, content_type, body).await?;
            Ok(())
        }
    }

    pub(crate) async fn size(&self, key: &str) -> Result<u64, StorageError> {
        check_key(key)?;
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        Ok(meta.content_length())
    }
}
