//! Typed lifecycle events and their dispatch to registered hooks.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::item::Item;
use crate::storage::StorageError;

/// An item lifecycle event raised by the item engine.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// The item record is gone. Raised after deletion.
    Deleted {
        /// Deleted item.
        item: Item,
    },
    /// A copy is about to be persisted. Raised before the copy is stored,
    /// so hooks may rewrite it.
    Copying {
        /// Source item.
        original: Item,
        /// Copy awaiting persistence.
        copy: Item,
    },
}

impl LifecycleEvent {
    /// Event name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deleted { .. } => "deleted",
            Self::Copying { .. } => "copying",
        }
    }

    fn item_type(&self) -> &str {
        match self {
            Self::Deleted { item } => &item.item_type,
            Self::Copying { original, .. } => &original.item_type,
        }
    }
}

/// What the engine should do after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Deletion handled. Nothing more to persist.
    Deleted,
    /// Persist this copy.
    Copied(Item),
}

/// Errors raised by hooks.
#[derive(Debug, Error)]
pub enum HookError {
    /// Storage operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Hook refused the event.
    #[error("hook rejected event: {0}")]
    Rejected(String),
}

/// A subscriber to item lifecycle events.
///
/// Only hooks whose [`handles`](LifecycleHook::handles) accepts the item's
/// type are called.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Hook name for logs.
    fn name(&self) -> &'static str;

    /// Whether this hook reacts to items of `item_type`.
    fn handles(&self, item_type: &str) -> bool;

    /// Called after `item` was deleted. Errors are logged, never propagated.
    async fn after_delete(&self, _item: &Item) -> Result<(), HookError> {
        Ok(())
    }

    /// Called before `copy` of `original` is persisted. An error aborts the
    /// copy.
    async fn before_copy(&self, _original: &Item, _copy: &mut Item) -> Result<(), HookError> {
        Ok(())
    }
}

/// Delivers lifecycle events to the hooks registered at startup.
#[derive(Default, Clone)]
pub struct LifecycleDispatcher {
    hooks: Vec<Arc<dyn LifecycleHook>>,
}

impl LifecycleDispatcher {
    /// Create a dispatcher with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Deliver `event` to every hook that handles the item's type.
    ///
    /// Post-deletion failures are logged and swallowed. Pre-copy failures
    /// abort dispatch and are returned.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a pre-copy hook.
    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<DispatchOutcome, HookError> {
        let event_name = event.name();
        let hooks: Vec<_> = self
            .hooks
            .iter()
            .filter(|hook| hook.handles(event.item_type()))
            .collect();
        debug!(event = event_name, hooks = hooks.len(), "dispatching lifecycle event");

        match event {
            LifecycleEvent::Deleted { item } => {
                for hook in hooks {
                    if let Err(e) = hook.after_delete(&item).await {
                        warn!(
                            hook = hook.name(),
                            item_id = %item.id,
                            error = %e,
                            "post-delete hook failed"
                        );
                    }
                }
                Ok(DispatchOutcome::Deleted)
            }
            LifecycleEvent::Copying { original, mut copy } => {
                for hook in hooks {
                    if let Err(e) = hook.before_copy(&original, &mut copy).await {
                        error!(
                            hook = hook.name(),
                            item_id = %original.id,
                            error = %e,
                            "pre-copy hook failed"
                        );
                        return Err(e);
                    }
                }
                Ok(DispatchOutcome::Copied(copy))
            }
        }
    }
}

impl std::fmt::Debug for LifecycleDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("LifecycleDispatcher")
            .field("hooks", &names)
            .finish()
    }
}
