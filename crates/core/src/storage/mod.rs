//! Storage backends for uploaded file content.
//!
//! Two variants sit behind one [`StorageBackend`] trait:
//! - Local filesystem (OpenDAL `fs`): keys are files under a root directory
//! - Object store (OpenDAL `s3`): keys are objects in a bucket
//!
//! The variant is picked once from [`StorageConfig`] by [`build_backend`]
//! and shared as `Arc<dyn StorageBackend>`.

mod backend;
mod config;
mod error;
mod local;
mod object;
mod operator;
pub mod path;

#[cfg(test)]
mod path_props;

pub use backend::{ByteStream, StorageBackend, build_backend};
#[cfg(test)]
pub(crate) use backend::{byte_stream, collect_bytes};
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use local::LocalBackend;
pub use object::ObjectBackend;
