//! Item lifecycle events and the hooks that react to them.
//!
//! The item engine raises a [`LifecycleEvent`] when an item is deleted or
//! copied. The [`LifecycleDispatcher`] hands it to every registered hook
//! whose type filter matches. [`FileLifecycleHooks`] keeps stored content in
//! step with file items.

mod dispatcher;
mod file_hooks;


pub use dispatcher::{DispatchOutcome, HookError, LifecycleDispatcher, LifecycleEvent, LifecycleHook};
pub use file_hooks::FileLifecycleHooks;
