//! Interfaces of the collaborators that own items and permissions.
//!
//! The storage core never persists items itself. It calls into these traits
//! and is called back through lifecycle events.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::ItemError;
use super::types::{Actor, Item, NewItem};

/// Item persistence.
#[async_trait]
pub trait ItemEngine: Send + Sync {
    /// Create an item, optionally under `parent_id`.
    async fn create_item(
        &self,
        actor: &Actor,
        data: NewItem,
        parent_id: Option<Uuid>,
    ) -> Result<Item, ItemError>;

    /// Fetch an item by ID.
    async fn get_item(&self, id: Uuid) -> Result<Item, ItemError>;

    /// Fetch an item visible to anonymous callers.
    async fn get_public_item(&self, id: Uuid) -> Result<Item, ItemError>;
}

/// Permission checks.
#[async_trait]
pub trait MembershipEngine: Send + Sync {
    /// Whether `actor` may create items under `item_id`.
    async fn can_write(&self, actor: &Actor, item_id: Uuid) -> Result<(), ItemError>;

    /// Whether `actor` may read `item_id`.
    async fn can_read(&self, actor: &Actor, item_id: Uuid) -> Result<(), ItemError>;
}

/// Upload allowance check, consulted before any bytes are stored.
#[async_trait]
pub trait UploadLimiter: Send + Sync {
    /// Fails with `ItemError::QuotaExceeded` when `actor` may not upload
    /// more items of `item_type`.
    async fn check(&self, actor: &Actor, item_type: &str) -> Result<(), ItemError>;
}
