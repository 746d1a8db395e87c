//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use fileitem_shared::{StorageBackendSettings, StorageSettings};

use super::error::StorageError;
use crate::item::FileItemType;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: AWS S3, MinIO, Cloudflare R2
    S3 {
        /// AWS region.
        region: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// Custom endpoint URL for S3-compatible services.
        endpoint: Option<String>,
    },
    /// Local filesystem
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        region: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self::S3 {
            region: region.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            endpoint: None,
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }

    /// The item type whose files live in this provider.
    #[must_use]
    pub fn file_type(&self) -> FileItemType {
        match self {
            Self::S3 { .. } => FileItemType::S3,
            Self::LocalFs { .. } => FileItemType::Local,
        }
    }

    /// Check the provider parameters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` when the local root is not an
    /// absolute path without trailing separator, or when any S3 credential
    /// is missing.
    pub fn validate(&self) -> Result<(), StorageError> {
        match self {
            Self::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("local root is not valid UTF-8"))?;
                if !root.starts_with('/') {
                    return Err(StorageError::configuration(format!(
                        "local root '{root}' must start with '/'"
                    )));
                }
                if root.len() > 1 && root.ends_with('/') {
                    return Err(StorageError::configuration(format!(
                        "local root '{root}' must not end with '/'"
                    )));
                }
                Ok(())
            }
            Self::S3 {
                region,
                bucket,
                access_key_id,
                secret_access_key,
                ..
            } => {
                let missing: Vec<&str> = [
                    ("region", region),
                    ("bucket", bucket),
                    ("access_key_id", access_key_id),
                    ("secret_access_key", secret_access_key),
                ]
                .into_iter()
                .filter(|(_, value)| value.trim().is_empty())
                .map(|(name, _)| name)
                .collect();

                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(StorageError::configuration(format!(
                        "missing s3 settings: {}",
                        missing.join(", ")
                    )))
                }
            }
        }
    }
}

/// Storage service configuration.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Prefix for allocated keys, empty or ending with `/`.
    pub path_prefix: String,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Maximum number of files per upload request.
    pub max_files: usize,
    /// Per-member upload allowance in bytes.
    pub quota_bytes: Option<u64>,
}

impl StorageConfig {
    /// Default max file size: 250MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 250 * 1024 * 1024;
    /// Default max files per request.
    pub const DEFAULT_MAX_FILES: usize = 5;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            path_prefix: String::new(),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            max_files: Self::DEFAULT_MAX_FILES,
            quota_bytes: None,
        }
    }

    /// Build a validated config from raw settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` for malformed roots, prefixes,
    /// limits, or missing credentials.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match &settings.backend {
            StorageBackendSettings::Local { root } => StorageProvider::local_fs(root),
            StorageBackendSettings::S3 {
                region,
                bucket,
                access_key_id,
                secret_access_key,
                endpoint,
            } => StorageProvider::S3 {
                region: region.clone(),
                bucket: bucket.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                endpoint: endpoint.clone().filter(|e| !e.trim().is_empty()),
            },
        };

        let config = Self::new(provider)
            .with_path_prefix(&settings.path_prefix)?
            .with_max_file_size(settings.max_file_size)
            .with_max_files(settings.max_files)
            .with_quota(settings.quota_bytes);
        config.validate()?;
        Ok(config)
    }

    /// Set the key prefix.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if the prefix starts with `/`.
    pub fn with_path_prefix(mut self, prefix: &str) -> Result<Self, StorageError> {
        self.path_prefix = normalize_prefix(prefix)?;
        Ok(self)
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set maximum files per request.
    #[must_use]
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    /// Set per-member upload allowance.
    #[must_use]
    pub fn with_quota(mut self, bytes: Option<u64>) -> Self {
        self.quota_bytes = bytes;
        self
    }

    /// Validate provider and limits.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` on the first violation found.
    pub fn validate(&self) -> Result<(), StorageError> {
        self.provider.validate()?;
        if self.max_file_size == 0 {
            return Err(StorageError::configuration("max_file_size must be positive"));
        }
        if self.max_files == 0 {
            return Err(StorageError::configuration("max_files must be positive"));
        }
        Ok(())
    }

    /// The item type handled by this configuration.
    #[must_use]
    pub fn file_type(&self) -> FileItemType {
        self.provider.file_type()
    }
}

/// Reject absolute prefixes and make sure non-empty ones end with `/`.
fn normalize_prefix(prefix: &str) -> Result<String, StorageError> {
    if prefix.starts_with('/') {
        return Err(StorageError::configuration(format!(
            "path prefix '{prefix}' must not start with '/'"
        )));
    }
    if prefix.split('/').any(|segment| segment == "..") {
        return Err(StorageError::configuration(format!(
            "path prefix '{prefix}' must not contain '..'"
        )));
    }
    if prefix.is_empty() || prefix.ends_with('/') {
        Ok(prefix.to_string())
    } else {
        Ok(format!("{prefix}/"))
    }
}
