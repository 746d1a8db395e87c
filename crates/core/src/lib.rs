//! Storage lifecycle core for Fileitem.
//!
//! This crate contains the file-item logic with ZERO web dependencies.
//! File content lives in a pluggable storage backend; items, permissions and
//! quotas are owned by collaborators behind traits.
//!
//! # Modules
//!
//! - `storage` - Path allocation and the local / object-store backends
//! - `item` - Item model, collaborator traits, in-memory engine
//! - `upload` - Streaming upload ingestion
//! - `download` - Permission-checked retrieval
//! - `lifecycle` - Delete/copy events and the file content hooks

pub mod download;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod storage;
pub mod upload;

#[cfg(test)]
mod testing;

pub use download::{DownloadHandler, FileDownload, content_disposition};
pub use error::FileItemError;
