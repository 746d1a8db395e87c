//! Items as seen by the storage core.
//!
//! Item persistence, permissions and quotas belong to collaborators behind
//! the traits in this module. [`MemoryItemEngine`] implements all of them
//! in-process.

mod engine;
mod error;
mod memory;
mod types;

pub use engine::{ItemEngine, MembershipEngine, UploadLimiter};
pub use error::ItemError;
pub use memory::{FOLDER_TYPE, MemoryItemEngine, Permission};
pub use types::{Actor, FileExtra, FileItemType, Item, NewItem, Requester};
