//! In-process item engine backed by concurrent maps.
//!
//! Stands in for the hosting platform: it owns item records, memberships and
//! public visibility, enforces the upload allowance, and raises lifecycle
//! events when items are deleted or copied.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Map;
use tracing::{info, warn};
use uuid::Uuid;

use super::engine::{ItemEngine, MembershipEngine, UploadLimiter};
use super::error::ItemError;
use super::types::{Actor, FileItemType, Item, NewItem};
use crate::lifecycle::{DispatchOutcome, LifecycleDispatcher, LifecycleEvent};

/// Item type of containers.
pub const FOLDER_TYPE: &str = "folder";

/// Membership level on an item and its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// View and download.
    Read,
    /// Create children.
    Write,
    /// Delete.
    Admin,
}

#[derive(Debug, Clone)]
struct Record {
    item: Item,
    creator: Uuid,
    parent_id: Option<Uuid>,
    public: bool,
}

/// Item engine holding everything in memory.
#[derive(Debug)]
pub struct MemoryItemEngine {
    items: DashMap<Uuid, Record>,
    memberships: DashMap<(Uuid, Uuid), Permission>,
    dispatcher: LifecycleDispatcher,
    quota: Option<(FileItemType, u64)>,
}

impl MemoryItemEngine {
    /// Create an engine delivering lifecycle events to `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: LifecycleDispatcher) -> Self {
        Self {
            items: DashMap::new(),
            memberships: DashMap::new(),
            dispatcher,
            quota: None,
        }
    }

    /// Limit each member to `limit` bytes of `file_type` items.
    #[must_use]
    pub fn with_quota(mut self, file_type: FileItemType, limit: Option<u64>) -> Self {
        self.quota = limit.map(|limit| (file_type, limit));
        self
    }

    /// Grant `member` a permission on `item_id` and its descendants.
    pub fn grant(&self, member: Uuid, item_id: Uuid, permission: Permission) {
        self.memberships.insert((member, item_id), permission);
    }

    /// Make `item_id` and its descendants visible on the public surface.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::NotFound` if the item does not exist.
    pub fn publish(&self, item_id: Uuid) -> Result<(), ItemError> {
        let mut record = self
            .items
            .get_mut(&item_id)
            .ok_or(ItemError::NotFound(item_id))?;
        record.public = true;
        Ok(())
    }

    /// Check that `actor` administers `item_id`.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::NotFound` or `ItemError::PermissionDenied`.
    pub fn require_admin(&self, actor: &Actor, item_id: Uuid) -> Result<(), ItemError> {
        self.require(actor, item_id, Permission::Admin)
    }

    /// Create a folder.
    ///
    /// # Errors
    ///
    /// Same as [`ItemEngine::create_item`].
    pub async fn create_folder(
        &self,
        actor: &Actor,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Item, ItemError> {
        let data = NewItem {
            name: name.to_string(),
            item_type: FOLDER_TYPE.to_string(),
            extra: Map::new(),
            settings: Map::new(),
        };
        self.create_item(actor, data, parent_id).await
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Delete an item and its descendants.
    ///
    /// A `Deleted` event is raised for every removed item once the records
    /// are gone. Returns the removed items.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::NotFound` if the item does not exist, or
    /// `ItemError::PermissionDenied` unless `actor` is an admin of it.
    pub async fn delete_item(&self, actor: &Actor, id: Uuid) -> Result<Vec<Item>, ItemError> {
        self.require(actor, id, Permission::Admin)?;

        let subtree = self.subtree(id);
        let mut removed = Vec::with_capacity(subtree.len());
        for item_id in subtree {
            if let Some((_, record)) = self.items.remove(&item_id) {
                removed.push(record.item);
            }
            self.memberships.retain(|(_, target), _| *target != item_id);
        }
        info!(item_id = %id, count = removed.len(), "deleted items");

        for item in &removed {
            self.dispatcher
                .dispatch(LifecycleEvent::Deleted { item: item.clone() })
                .await?;
        }
        Ok(removed)
    }

    /// Copy an item and its descendants under `parent_id`.
    ///
    /// A `Copying` event is raised for every item before anything is stored.
    /// If any hook fails, copies prepared so far are discarded through
    /// `Deleted` events and nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::NotFound` or `ItemError::PermissionDenied` from the
    /// permission checks, or `ItemError::Hook` if a pre-copy hook failed.
    pub async fn copy_item(
        &self,
        actor: &Actor,
        id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Item, ItemError> {
        self.require(actor, id, Permission::Read)?;
        if let Some(parent_id) = parent_id {
            self.require_folder(parent_id)?;
            self.require(actor, parent_id, Permission::Write)?;
        }

        let mut id_map: HashMap<Uuid, Uuid> = HashMap::new();
        let mut prepared: Vec<(Item, Option<Uuid>)> = Vec::new();
        for source_id in self.subtree(id) {
            let Some(source) = self.items.get(&source_id).map(|r| r.value().clone()) else {
                continue;
            };
            let new_parent = if source_id == id {
                parent_id
            } else {
                source.parent_id.and_then(|p| id_map.get(&p).copied())
            };

            let mut copy = source.item.clone();
            copy.id = Uuid::new_v4();
            id_map.insert(source_id, copy.id);

            let event = LifecycleEvent::Copying {
                original: source.item,
                copy,
            };
            match self.dispatcher.dispatch(event).await {
                Ok(DispatchOutcome::Copied(copy)) => prepared.push((copy, new_parent)),
                Ok(DispatchOutcome::Deleted) => {}
                Err(e) => {
                    self.discard(prepared).await;
                    return Err(e.into());
                }
            }
        }

        let root_copy = id_map
            .get(&id)
            .copied()
            .ok_or(ItemError::NotFound(id))?;
        for (copy, new_parent) in prepared {
            self.insert(actor, copy, new_parent);
        }
        info!(item_id = %id, copy_id = %root_copy, "copied item");
        self.get_item(root_copy).await
    }

    async fn discard(&self, prepared: Vec<(Item, Option<Uuid>)>) {
        for (copy, _) in prepared {
            let copy_id = copy.id;
            if let Err(e) = self
                .dispatcher
                .dispatch(LifecycleEvent::Deleted { item: copy })
                .await
            {
                warn!(item_id = %copy_id, error = %e, "failed to discard prepared copy");
            }
        }
    }

    fn insert(&self, actor: &Actor, item: Item, parent_id: Option<Uuid>) {
        if parent_id.is_none() {
            self.grant(actor.id, item.id, Permission::Admin);
        }
        self.items.insert(
            item.id,
            Record {
                item,
                creator: actor.id,
                parent_id,
                public: false,
            },
        );
    }

    /// `id` followed by all its descendants, breadth first.
    fn subtree(&self, id: Uuid) -> Vec<Uuid> {
        let mut out = vec![id];
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let children: Vec<Uuid> = self
                .items
                .iter()
                .filter(|r| r.parent_id == Some(current))
                .map(|r| *r.key())
                .collect();
            out.extend(&children);
            queue.extend(children);
        }
        out
    }

    /// `id` followed by its ancestors.
    fn ancestry(&self, id: Uuid) -> Vec<Record> {
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(item_id) = current {
            let Some(record) = self.items.get(&item_id).map(|r| r.value().clone()) else {
                break;
            };
            current = record.parent_id;
            out.push(record);
        }
        out
    }

    fn permission(&self, member: Uuid, id: Uuid) -> Option<Permission> {
        self.ancestry(id)
            .iter()
            .filter_map(|record| self.memberships.get(&(member, record.item.id)).map(|p| *p))
            .max()
    }

    fn require(&self, actor: &Actor, id: Uuid, needed: Permission) -> Result<(), ItemError> {
        if !self.items.contains_key(&id) {
            return Err(ItemError::NotFound(id));
        }
        match self.permission(actor.id, id) {
            Some(granted) if granted >= needed => Ok(()),
            _ => Err(ItemError::permission_denied(format!(
                "member {} lacks {needed:?} permission on item {id}",
                actor.id
            ))),
        }
    }

    fn require_folder(&self, id: Uuid) -> Result<(), ItemError> {
        let record = self.items.get(&id).ok_or(ItemError::NotFound(id))?;
        if record.item.item_type == FOLDER_TYPE {
            Ok(())
        } else {
            Err(ItemError::rejected(format!("parent {id} is not a folder")))
        }
    }

    fn used_bytes(&self, member: Uuid, file_type: FileItemType) -> u64 {
        self.items
            .iter()
            .filter(|r| r.creator == member)
            .filter_map(|r| r.item.file_extra(file_type))
            .map(|extra| extra.size)
            .fold(0u64, u64::saturating_add)
    }
}

#[async_trait]
impl ItemEngine for MemoryItemEngine {
    async fn create_item(
        &self,
        actor: &Actor,
        data: NewItem,
        parent_id: Option<Uuid>,
    ) -> Result<Item, ItemError> {
        if data.name.trim().is_empty() {
            return Err(ItemError::rejected("item name must not be empty"));
        }
        if let Some(parent_id) = parent_id {
            self.require_folder(parent_id)?;
            self.require(actor, parent_id, Permission::Write)?;
        }

        let item = Item {
            id: Uuid::new_v4(),
            name: data.name,
            item_type: data.item_type,
            extra: data.extra,
            settings: data.settings,
        };
        self.insert(actor, item.clone(), parent_id);
        info!(item_id = %item.id, item_type = %item.item_type, "created item");
        Ok(item)
    }

    async fn get_item(&self, id: Uuid) -> Result<Item, ItemError> {
        self.items
            .get(&id)
            .map(|r| r.item.clone())
            .ok_or(ItemError::NotFound(id))
    }

    async fn get_public_item(&self, id: Uuid) -> Result<Item, ItemError> {
        let ancestry = self.ancestry(id);
        // Hidden items look missing to anonymous callers.
        if ancestry.iter().any(|record| record.public) {
            ancestry
                .into_iter()
                .next()
                .map(|record| record.item)
                .ok_or(ItemError::NotFound(id))
        } else {
            Err(ItemError::NotFound(id))
        }
    }
}

#[async_trait]
impl MembershipEngine for MemoryItemEngine {
    async fn can_write(&self, actor: &Actor, item_id: Uuid) -> Result<(), ItemError> {
        self.require(actor, item_id, Permission::Write)
    }

    async fn can_read(&self, actor: &Actor, item_id: Uuid) -> Result<(), ItemError> {
        self.require(actor, item_id, Permission::Read)
    }
}

#[async_trait]
impl UploadLimiter for MemoryItemEngine {
    async fn check(&self, actor: &Actor, item_type: &str) -> Result<(), ItemError> {
        let Some((file_type, limit)) = self.quota else {
            return Ok(());
        };
        if file_type.as_str() != item_type {
            return Ok(());
        }
        let used = self.used_bytes(actor.id, file_type);
        if used >= limit {
            return Err(ItemError::QuotaExceeded { used, limit });
        }
        Ok(())
    }
}
