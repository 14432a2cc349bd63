//! Identity map of live row mirrors.

use std::sync::Weak;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::model::{NodeHandle, NodeId, Row};

/// Registry of every live in-memory mirror, keyed by row id.
///
/// Holds weak references only: a mirror lives as long as some caller keeps
/// its handle. The registry serves two purposes: loading a row twice
/// yields the same mirror, and bulk boundary shifts can patch every
/// cached copy so none goes stale mid-transaction.
#[derive(Debug, Default)]
pub struct MirrorRegistry {
    inner: Mutex<FxHashMap<NodeId, Weak<RwLock<Row>>>>,
}

impl MirrorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live mirror for a row id, if one exists.
    pub fn get(&self, id: NodeId) -> Option<NodeHandle> {
        let mut inner = self.inner.lock();
        match inner.get(&id).and_then(Weak::upgrade) {
            Some(arc) => Some(NodeHandle::from_arc(arc)),
            None => {
                inner.remove(&id);
                None
            }
        }
    }

    /// Returns the live mirror for a row, hydrating and registering one if
    /// none exists. An already-live mirror is returned as-is; mirrors are
    /// kept consistent by the shifter, not refreshed on load.
    pub fn adopt(&self, row: Row) -> NodeHandle {
        let mut inner = self.inner.lock();
        if let Some(arc) = inner.get(&row.id).and_then(Weak::upgrade) {
            return NodeHandle::from_arc(arc);
        }
        let handle = NodeHandle::new(row);
        inner.insert(handle.id(), handle.downgrade());
        handle
    }

    /// Drops the registry entry for a deleted row.
    pub fn forget(&self, id: NodeId) {
        self.inner.lock().remove(&id);
    }

    /// Invokes `f` for every live mirror, pruning dead entries.
    ///
    /// Handles are collected before `f` runs so the registry lock is not
    /// held while row locks are taken.
    pub fn for_each_live<F: FnMut(&NodeHandle)>(&self, mut f: F) {
        let live: Vec<NodeHandle> = {
            let mut inner = self.inner.lock();
            inner.retain(|_, weak| weak.strong_count() > 0);
            inner
                .values()
                .filter_map(|weak| weak.upgrade().map(NodeHandle::from_arc))
                .collect()
        };
        for handle in &live {
            f(handle);
        }
    }
}
