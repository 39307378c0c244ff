//! Identity-keyed routing of host tree events to the slots that mirror them.
//!
//! A target registers a root identity; with `deep` registration every current
//! descendant is registered too, all carrying the root as their *origin*.
//! Descendants recruited later through [`Registry::add_sub_informant`] inherit
//! the origin of the parent that recruited them, so a target can always tell
//! "my root changed" (`id == origin`) from "something under my root changed".

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use informant_core::{Error, HostTree, NodeId, PropsDelta, Result, UiHandle};
use parking_lot::ReentrantMutex;
use slotmap::SlotMap;

slotmap::new_key_type! {
    pub struct TargetKey;
}

/// Receiver of routed host events. All calls arrive on the UI thread with the
/// tree that produced them.
pub trait InformantTarget: Send + Sync {
    fn on_props_received(&self, tree: &dyn HostTree, id: NodeId, origin: NodeId, delta: &PropsDelta);

    fn on_child_added(&self, tree: &dyn HostTree, origin: NodeId, parent: NodeId, child: NodeId);

    fn on_child_removed(&self, tree: &dyn HostTree, origin: NodeId, parent: NodeId, child: NodeId);

    fn on_invalidated(&self, tree: &dyn HostTree, id: NodeId, origin: NodeId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub target: TargetKey,
    pub origin: NodeId,
}

#[derive(Default)]
struct RegistryState {
    targets: SlotMap<TargetKey, Arc<dyn InformantTarget>>,
    entries: HashMap<NodeId, Entry>,
}

/// Registration table. The lock is reentrant so a target may call back into
/// the registry from inside a callback; the state cell is never borrowed
/// while a callback runs.
pub struct Registry {
    inner: ReentrantMutex<RefCell<RegistryState>>,
    ui: UiHandle,
}

impl Registry {
    pub fn new(ui: UiHandle) -> Arc<Self> {
        Arc::new(Self {
            inner: ReentrantMutex::new(RefCell::new(RegistryState::default())),
            ui,
        })
    }

    pub fn ui(&self) -> &UiHandle {
        &self.ui
    }

    pub fn register_target(&self, target: Arc<dyn InformantTarget>) -> TargetKey {
        let guard = self.inner.lock();
        let key = guard.borrow_mut().targets.insert(target);
        key
    }

    /// Drops the target and every entry routed to it. Returns the number of
    /// entries removed.
    pub fn remove_target(&self, key: TargetKey) -> usize {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        state.targets.remove(key);
        let before = state.entries.len();
        state.entries.retain(|_, e| e.target != key);
        before - state.entries.len()
    }

    /// Drops every entry `key` holds under `origin`.
    pub fn remove_origin(&self, key: TargetKey, origin: NodeId) -> usize {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, e| !(e.target == key && e.origin == origin));
        before - state.entries.len()
    }

    /// Registers `root` for `key`.
    ///
    /// Shallow registration is recorded immediately. Deep registration has to
    /// walk the live tree, so it is posted to the UI context and completes on
    /// its next pump; callers must not assume it has happened on return.
    /// Use [`Registry::add_with`] when already on the UI thread with the tree.
    pub fn add(self: &Arc<Self>, key: TargetKey, root: NodeId, deep: bool) {
        if !deep {
            let guard = self.inner.lock();
            guard.borrow_mut().entries.insert(root, Entry { target: key, origin: root });
            return;
        }
        let weak = Arc::downgrade(self);
        self.ui.post(move |tree| {
            let Some(registry) = weak.upgrade() else {
                return;
            };
            if let Err(e) = registry.add_with(tree, key, root, true) {
                log::warn!("deferred registration of {root} aborted: {e}");
            }
        });
    }

    /// Registers `root` (and, if `deep`, all its current descendants) with
    /// `root` as their origin.
    pub fn add_with(&self, tree: &dyn HostTree, key: TargetKey, root: NodeId, deep: bool) -> Result<()> {
        let guard = self.inner.lock();
        if !tree.contains(root) {
            return Err(Error::Resolution(root));
        }
        if !guard.borrow().targets.contains_key(key) {
            return Err(Error::Untracked(root));
        }
        self.traverse_registration(tree, key, root, root, deep);
        Ok(())
    }

    fn traverse_registration(&self, tree: &dyn HostTree, key: TargetKey, id: NodeId, origin: NodeId, deep: bool) {
        {
            let guard = self.inner.lock();
            guard.borrow_mut().entries.insert(id, Entry { target: key, origin });
        }
        if deep {
            for child in tree.children(id) {
                self.traverse_registration(tree, key, child, origin, true);
            }
        }
    }

    /// `child` was attached under `parent`. If `parent` is registered, its
    /// target hears about it first, then `child` is recruited under the same
    /// origin as `parent`.
    pub fn add_sub_informant(&self, tree: &dyn HostTree, parent: NodeId, child: NodeId, deep: bool) {
        let _guard = self.inner.lock();
        let Some(entry) = self.entry(parent) else {
            return;
        };
        if !tree.contains(child) {
            log::warn!("cannot recruit {child} under {parent}: {}", Error::Resolution(child));
            return;
        }
        if let Some(target) = self.target(entry.target) {
            target.on_child_added(tree, entry.origin, parent, child);
        }
        self.traverse_registration(tree, entry.target, child, entry.origin, deep);
    }

    /// `child` was detached from `parent`. The child's own entry is dropped and
    /// its target notified with that entry; a deep removal then walks a
    /// snapshot of the child's children.
    pub fn remove_sub_informant(&self, tree: &dyn HostTree, parent: NodeId, child: NodeId, deep: bool) {
        let guard = self.inner.lock();
        let removed = guard.borrow_mut().entries.remove(&child);
        let Some(entry) = removed else {
            log::debug!("ignoring removal of unregistered {child}");
            return;
        };
        if let Some(target) = self.target(entry.target) {
            target.on_child_removed(tree, entry.origin, parent, child);
        }
        if deep {
            let children = tree.children(child);
            for grandchild in children {
                self.remove_sub_informant(tree, child, grandchild, true);
            }
        }
    }

    /// Drops `id`'s own entry. Descendants keep theirs.
    pub fn remove(&self, id: NodeId) -> bool {
        let guard = self.inner.lock();
        let removed = guard.borrow_mut().entries.remove(&id).is_some();
        removed
    }

    pub fn inform_received_props(&self, tree: &dyn HostTree, id: NodeId, delta: &PropsDelta) {
        let _guard = self.inner.lock();
        let Some((target, origin)) = self.route(id) else {
            return;
        };
        target.on_props_received(tree, id, origin, delta);
    }

    pub fn inform_invalidation(&self, tree: &dyn HostTree, id: NodeId) {
        let _guard = self.inner.lock();
        let Some((target, origin)) = self.route(id) else {
            return;
        };
        target.on_invalidated(tree, id, origin);
    }

    // Host-facing names for the four inbound events.

    pub fn node_added(&self, tree: &dyn HostTree, parent: NodeId, child: NodeId) {
        self.add_sub_informant(tree, parent, child, true);
    }

    /// Call after `child` is detached but before it is destroyed: the deep
    /// walk reads `child`'s children from `tree`, and a destroyed child has
    /// none, which leaves its descendants' entries behind until the origin is
    /// released.
    pub fn node_removed(&self, tree: &dyn HostTree, parent: NodeId, child: NodeId) {
        self.remove_sub_informant(tree, parent, child, true);
    }

    pub fn node_invalidated(&self, tree: &dyn HostTree, id: NodeId) {
        self.inform_invalidation(tree, id);
    }

    pub fn props_changed(&self, tree: &dyn HostTree, id: NodeId, delta: &PropsDelta) {
        self.inform_received_props(tree, id, delta);
    }

    pub fn entry(&self, id: NodeId) -> Option<Entry> {
        let guard = self.inner.lock();
        let entry = guard.borrow().entries.get(&id).copied();
        entry
    }

    pub fn origin_of(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).map(|e| e.origin)
    }

    pub fn target_of(&self, id: NodeId) -> Option<TargetKey> {
        self.entry(id).map(|e| e.target)
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.lock();
        let len = guard.borrow().entries.len();
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn target(&self, key: TargetKey) -> Option<Arc<dyn InformantTarget>> {
        let guard = self.inner.lock();
        let target = guard.borrow().targets.get(key).cloned();
        target
    }

    fn route(&self, id: NodeId) -> Option<(Arc<dyn InformantTarget>, NodeId)> {
        let entry = self.entry(id)?;
        Some((self.target(entry.target)?, entry.origin))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .finish()
    }
}
