//! Bulk boundary-marker adjustment.

use tracing::debug;

use crate::config::ForestConfig;
use crate::error::Result;
use crate::query::Value;
use crate::store::{ShiftKind, ShiftSpec, TreeStore, UpdateOrder};

/// Executes bulk boundary shifts against the store and keeps every live
/// mirror numerically consistent with the table.
///
/// The mirror patching is mandatory: later steps of the same mutation read
/// boundaries from mirrors, and a stale mirror silently corrupts the tree.
pub struct RangeShifter<'e, S: TreeStore> {
    store: &'e S,
    config: &'e ForestConfig,
}

impl<'e, S: TreeStore> RangeShifter<'e, S> {
    /// Creates a shifter over the given store and configuration.
    pub fn new(store: &'e S, config: &'e ForestConfig) -> Self {
        Self { store, config }
    }

    /// Adds `delta` to every left boundary `>= threshold` and every right
    /// boundary `>= threshold` within the forest. Opens a gap when `delta`
    /// is positive, closes one when negative.
    pub fn shift_from(&self, tree: Option<&Value>, threshold: i64, delta: i64) -> Result<()> {
        let order = UpdateOrder::for_delta(delta);
        let tree_filter = self.tree_filter(tree);
        let mut rows = 0;
        // Two-phase protocol: the left column first, then the right
        // column, each in the order dictated by the delta sign.
        for column in [self.config.left(), self.config.right()] {
            rows += self.store.bulk_shift(&ShiftSpec {
                tree_filter: tree_filter.clone(),
                kind: ShiftKind::Column { column, threshold },
                delta,
                order,
            })?;
        }
        debug!(threshold, delta, rows, "boundary shift applied");

        self.store.mirrors().for_each_live(|handle| {
            if !self.mirror_in_tree(handle, tree) {
                return;
            }
            let mut row = handle.write();
            for column in [self.config.left(), self.config.right()] {
                if let Ok(value) = row.int(column) {
                    if value >= threshold {
                        row.set(column, Value::Int(value + delta));
                    }
                }
            }
        });
        Ok(())
    }

    /// Adds `delta` to both boundaries of every node whose interval lies
    /// within `[low, high]`, relocating a contiguous subtree block without
    /// touching nodes outside it.
    pub fn shift_range(&self, tree: Option<&Value>, low: i64, high: i64, delta: i64) -> Result<()> {
        let order = UpdateOrder::for_delta(delta);
        let rows = self.store.bulk_shift(&ShiftSpec {
            tree_filter: self.tree_filter(tree),
            kind: ShiftKind::Block {
                left: self.config.left(),
                right: self.config.right(),
                low,
                high,
            },
            delta,
            order,
        })?;
        debug!(low, high, delta, rows, "subtree block shifted");

        self.store.mirrors().for_each_live(|handle| {
            if !self.mirror_in_tree(handle, tree) {
                return;
            }
            let mut row = handle.write();
            let (Ok(l), Ok(r)) = (row.int(self.config.left()), row.int(self.config.right()))
            else {
                return;
            };
            if l >= low && r <= high {
                row.set(self.config.left(), Value::Int(l + delta));
                row.set(self.config.right(), Value::Int(r + delta));
            }
        });
        Ok(())
    }

    fn tree_filter(&self, tree: Option<&Value>) -> Option<(&'e str, Value)> {
        match (self.config.tree(), tree) {
            (Some(field), Some(value)) => Some((field, value.clone())),
            _ => None,
        }
    }

    fn mirror_in_tree(&self, handle: &crate::model::NodeHandle, tree: Option<&Value>) -> bool {
        match (self.config.tree(), tree) {
            (Some(_), Some(value)) => handle.tree_value(self.config).as_ref() == Some(value),
            _ => true,
        }
    }
}
