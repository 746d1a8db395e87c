//! Object store backend (S3-compatible) on OpenDAL's `s3` service.

use async_trait::async_trait;
use opendal::{Operator, services};

use super::backend::{ByteStream, StorageBackend};
use super::config::StorageProvider;
use super::error::StorageError;
use super::operator::OperatorStore;

/// Stores each key as an object in a bucket.
#[derive(Debug, Clone)]
pub struct ObjectBackend {
    store: OperatorStore,
}

impl ObjectBackend {
    /// Create the backend for an S3-compatible provider.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if the provider is not an
    /// object store or the client cannot be built.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StorageError> {
        let StorageProvider::S3 {
            region,
            bucket,
            access_key_id,
            secret_access_key,
            endpoint,
        } = provider
        else {
            return Err(StorageError::configuration(format!(
                "provider '{}' is not an object store",
                provider.name()
            )));
        };

        let mut builder = services::S3::default()
            .bucket(bucket)
            .region(region)
            .access_key_id(access_key_id)
            .secret_access_key(secret_access_key);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint(endpoint);
        }

        Ok(Self {
            store: OperatorStore::from_builder(builder)?,
        })
    }

    /// Wrap an existing operator.
    #[must_use]
    pub fn from_operator(operator: Operator) -> Self {
        Self {
            store: OperatorStore::new(operator),
        }
    }
}

#[async_trait]
impl StorageBackend for ObjectBackend {
    fn name(&self) -> &'static str {
        "s3"
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
