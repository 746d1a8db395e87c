//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// File storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Raw storage settings as read from configuration sources.
///
/// These are not validated here; `fileitem-core` turns them into an
/// immutable `StorageConfig` and rejects malformed values at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Selected backend and its connection parameters.
    pub backend: StorageBackendSettings,
    /// Key prefix prepended to every allocated storage path.
    #[serde(default)]
    pub path_prefix: String,
    /// Maximum size of a single uploaded file in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum number of files accepted in one upload request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Per-member upload allowance in bytes. `None` disables the limiter.
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

fn default_max_file_size() -> u64 {
    250 * 1024 * 1024 // 250MB
}

fn default_max_files() -> usize {
    5
}

/// Backend selection, tagged by the `type` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageBackendSettings {
    /// Files live under a directory on the local filesystem.
    Local {
        /// Absolute root directory, without trailing separator.
        root: String,
    },
    /// Files live in an S3-compatible bucket.
    S3 {
        /// Bucket region.
        #[serde(default)]
        region: String,
        /// Bucket name.
        #[serde(default)]
        bucket: String,
        /// Access key id.
        #[serde(default)]
        access_key_id: String,
        /// Secret access key.
        #[serde(default)]
        secret_access_key: String,
        /// Custom endpoint for S3-compatible services (MinIO, R2).
        #[serde(default)]
        endpoint: Option<String>,
    },
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FILEITEM").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
