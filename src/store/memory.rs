//! In-memory backing table with snapshot transactions.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Result, TreeError};
use crate::model::{NodeHandle, NodeId, Row, NULL_NODE_ID};
use crate::query::TreeQuery;
use crate::store::{MirrorRegistry, ShiftKind, ShiftSpec, TreeStore, UpdateOrder};

#[derive(Clone, Default)]
struct TableState {
    rows: FxHashMap<NodeId, Row>,
    next_id: NodeId,
}

struct Inner {
    state: TableState,
    snapshot: Option<TableState>,
}

/// In-memory [`TreeStore`] implementation.
///
/// Rows live in a hash table; transactions clone the table on `begin` and
/// restore the clone on `rollback`. Rollback also re-syncs every live
/// mirror from the restored rows, since mirrors patched mid-transaction
/// must not survive the rollback.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    mirrors: MirrorRegistry,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: TableState {
                    rows: FxHashMap::default(),
                    next_id: 1,
                },
                snapshot: None,
            }),
            mirrors: MirrorRegistry::new(),
        }
    }

    /// Number of rows currently in the table.
    pub fn len(&self) -> usize {
        self.inner.lock().state.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw copy of every row, unordered. Test and diagnostics helper.
    pub fn snapshot_rows(&self) -> Vec<Row> {
        self.inner.lock().state.rows.values().cloned().collect()
    }

    fn select(&self, query: &TreeQuery) -> Vec<Row> {
        let inner = self.inner.lock();
        let mut rows: Vec<Row> = inner
            .state
            .rows
            .values()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        drop(inner);
        if !query.ordering().is_empty() {
            rows.sort_by(|a, b| query.compare_rows(a, b));
        } else {
            rows.sort_by_key(|row| row.id);
        }
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }
        rows
    }

    fn matches_tree(row: &Row, tree_filter: &Option<(&str, crate::query::Value)>) -> bool {
        match tree_filter.as_ref() {
            None => true,
            Some(&(field, ref value)) => row.get(field) == Some(value),
        }
    }
}

impl TreeStore for MemoryStore {
    fn load(&self, id: NodeId) -> Result<Option<NodeHandle>> {
        if let Some(handle) = self.mirrors.get(id) {
            return Ok(Some(handle));
        }
        let row = self.inner.lock().state.rows.get(&id).cloned();
        Ok(row.map(|row| self.mirrors.adopt(row)))
    }

    fn fetch(&self, query: &TreeQuery) -> Result<Vec<NodeHandle>> {
        Ok(self
            .select(query)
            .into_iter()
            .map(|row| self.mirrors.adopt(row))
            .collect())
    }

    fn fetch_one(&self, query: &TreeQuery) -> Result<Option<NodeHandle>> {
        Ok(self
            .select(query)
            .into_iter()
            .next()
            .map(|row| self.mirrors.adopt(row)))
    }

    fn insert(&self, mut row: Row) -> Result<NodeHandle> {
        let mut inner = self.inner.lock();
        if row.id == NULL_NODE_ID {
            row.id = inner.state.next_id;
        } else if inner.state.rows.contains_key(&row.id) {
            return Err(TreeError::Storage(format!(
                "duplicate row id {} on insert",
                row.id
            )));
        }
        inner.state.next_id = inner.state.next_id.max(row.id + 1);
        inner.state.rows.insert(row.id, row.clone());
        drop(inner);
        Ok(self.mirrors.adopt(row))
    }

    fn save(&self, node: &NodeHandle) -> Result<bool> {
        let row = node.read().clone();
        let mut inner = self.inner.lock();
        if !inner.state.rows.contains_key(&row.id) {
            return Ok(false);
        }
        inner.state.rows.insert(row.id, row);
        Ok(true)
    }

    fn delete(&self, id: NodeId) -> Result<bool> {
        let existed = self.inner.lock().state.rows.remove(&id).is_some();
        if existed {
            self.mirrors.forget(id);
        }
        Ok(existed)
    }

    fn bulk_shift(&self, spec: &ShiftSpec<'_>) -> Result<usize> {
        let mut inner = self.inner.lock();
        match spec.kind {
            ShiftKind::Column { column, threshold } => {
                let mut hits: Vec<(NodeId, i64)> = Vec::new();
                for row in inner.state.rows.values() {
                    if !Self::matches_tree(row, &spec.tree_filter) {
                        continue;
                    }
                    let value = row.int(column)?;
                    if value >= threshold {
                        hits.push((row.id, value));
                    }
                }
                match spec.order {
                    UpdateOrder::Ascending => hits.sort_by_key(|&(_, v)| v),
                    UpdateOrder::Descending => hits.sort_by_key(|&(_, v)| std::cmp::Reverse(v)),
                }
                let count = hits.len();
                for (id, value) in hits {
                    if let Some(row) = inner.state.rows.get_mut(&id) {
                        row.set(column, (value + spec.delta).into());
                    }
                }
                Ok(count)
            }
            ShiftKind::Block {
                left,
                right,
                low,
                high,
            } => {
                let mut hits: Vec<(NodeId, i64, i64)> = Vec::new();
                for row in inner.state.rows.values() {
                    if !Self::matches_tree(row, &spec.tree_filter) {
                        continue;
                    }
                    let (l, r) = (row.int(left)?, row.int(right)?);
                    if l >= low && r <= high {
                        hits.push((row.id, l, r));
                    }
                }
                match spec.order {
                    UpdateOrder::Ascending => hits.sort_by_key(|&(_, _, r)| r),
                    UpdateOrder::Descending => hits.sort_by_key(|&(_, _, r)| std::cmp::Reverse(r)),
                }
                let count = hits.len();
                for (id, l, r) in hits {
                    if let Some(row) = inner.state.rows.get_mut(&id) {
                        row.set(left, (l + spec.delta).into());
                        row.set(right, (r + spec.delta).into());
                    }
                }
                Ok(count)
            }
        }
    }

    fn begin(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.snapshot.is_some() {
            return Err(TreeError::Storage(
                "a transaction is already open on this store".to_owned(),
            ));
        }
        inner.snapshot = Some(inner.state.clone());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.snapshot.take().is_none() {
            return Err(TreeError::Storage("commit without open transaction".to_owned()));
        }
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let Some(snapshot) = inner.snapshot.take() else {
            return Err(TreeError::Storage(
                "rollback without open transaction".to_owned(),
            ));
        };
        inner.state = snapshot;
        debug!(rows = inner.state.rows.len(), "transaction rolled back");

        // Mirrors patched during the aborted transaction are stale now;
        // re-sync them from the restored table. Mirrors of rows inserted
        // inside the transaction no longer have a backing row.
        let mut orphaned: Vec<NodeId> = Vec::new();
        self.mirrors.for_each_live(|handle| {
            let id = handle.id();
            match inner.state.rows.get(&id) {
                Some(row) => {
                    let mut mirror = handle.write();
                    mirror.fields = row.fields.clone();
                }
                None => orphaned.push(id),
            }
        });
        for id in orphaned {
            self.mirrors.forget(id);
        }
        Ok(())
    }

    fn mirrors(&self) -> &MirrorRegistry {
        &self.mirrors
    }
}
