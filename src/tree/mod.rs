//! The tree engine: interval encoding, navigation, and mutation over a
//! flat backing table.

mod dump;
mod interval;
mod mutate;
mod navigate;
mod shift;

pub use dump::TreeDump;
pub use interval::Interval;
pub use mutate::{AttachRequest, MoveRequest, Position};
pub use navigate::TreeNavigator;
pub use shift::RangeShifter;

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::warn;

use crate::config::ForestConfig;
use crate::error::{Result, TreeError};
use crate::model::{NodeHandle, NodeId};
use crate::query::{TreeQuery, Value};
use crate::store::TreeStore;

/// Facade over one tree-shaped model.
///
/// Owns the store and the resolved [`ForestConfig`]; navigation methods
/// delegate to [`TreeNavigator`], mutations run under the engine's write
/// lock inside a store transaction. Reads are not blocked by writers;
/// concurrent mutators are serialized by the lock (single-writer
/// discipline).
pub struct TreeEngine<S: TreeStore> {
    store: S,
    config: ForestConfig,
    write_lock: Mutex<()>,
}

impl<S: TreeStore> TreeEngine<S> {
    /// Opens the engine, validating the configuration.
    pub fn open(store: S, config: ForestConfig) -> Result<Self> {
        Ok(Self {
            store,
            config: config.resolved()?,
            write_lock: Mutex::new(()),
        })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// A navigator bound to this engine.
    pub fn navigator(&self) -> TreeNavigator<'_, S> {
        TreeNavigator::new(&self.store, &self.config)
    }

    pub(crate) fn shifter(&self) -> RangeShifter<'_, S> {
        RangeShifter::new(&self.store, &self.config)
    }

    /// Runs one mutation under the write lock, bracketed by a store
    /// transaction. Any error rolls the whole shift sequence back and is
    /// re-raised; there is no silent retry.
    pub(crate) fn with_mutation<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock();
        self.store.begin()?;
        match f() {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = self.store.rollback() {
                    warn!(%rollback_error, "rollback failed after aborted mutation");
                }
                Err(error)
            }
        }
    }

    // ---- lookup -----------------------------------------------------

    /// Loads a node by primary key.
    pub fn node(&self, id: NodeId) -> Result<NodeHandle> {
        self.store.load(id)?.ok_or(TreeError::NotFound("node"))
    }

    /// Executes a refined query.
    pub fn fetch(&self, query: &TreeQuery) -> Result<Vec<NodeHandle>> {
        self.store.fetch(query)
    }

    /// Executes a refined query, first match only.
    pub fn fetch_one(&self, query: &TreeQuery) -> Result<Option<NodeHandle>> {
        self.store.fetch_one(query)
    }

    /// The boundary markers of a node.
    pub fn interval(&self, node: &NodeHandle) -> Result<Interval> {
        node.interval(&self.config)
    }

    // ---- navigation -------------------------------------------------

    /// The root of a single-tree model.
    pub fn root(&self) -> Result<Option<NodeHandle>> {
        self.navigator().root(None)
    }

    /// The root of the given forest.
    pub fn root_of(&self, tree: &Value) -> Result<Option<NodeHandle>> {
        self.navigator().root(Some(tree))
    }

    /// Every root across all forests.
    pub fn roots(&self) -> Result<Vec<NodeHandle>> {
        self.navigator().roots()
    }

    /// The parent of a node.
    pub fn parent(&self, node: &NodeHandle) -> Result<Option<NodeHandle>> {
        self.navigator().parent(node)
    }

    /// Direct children in tree order.
    pub fn children(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.navigator().children(node)
    }

    /// All descendants in tree order.
    pub fn descendants(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.navigator().descendants(node)
    }

    /// A refinable query over a node's descendants.
    pub fn descendants_query(&self, node: &NodeHandle) -> Result<TreeQuery> {
        self.navigator().descendants_query(node)
    }

    /// Descendants without children of their own.
    pub fn leaf_descendants(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.navigator().leaf_descendants(node)
    }

    /// Ancestors, root first.
    pub fn ancestors(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.navigator().ancestors(node)
    }

    /// Children of the node's parent, the node included.
    pub fn siblings(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.navigator().siblings(node)
    }

    /// The sibling immediately before the node.
    pub fn previous_sibling(&self, node: &NodeHandle) -> Result<Option<NodeHandle>> {
        self.navigator().previous_sibling(node)
    }

    /// The sibling immediately after the node.
    pub fn next_sibling(&self, node: &NodeHandle) -> Result<Option<NodeHandle>> {
        self.navigator().next_sibling(node)
    }

    /// The first child of the node.
    pub fn first_child(&self, node: &NodeHandle) -> Result<Option<NodeHandle>> {
        self.navigator().first_child(node)
    }

    /// The last child of the node.
    pub fn last_child(&self, node: &NodeHandle) -> Result<Option<NodeHandle>> {
        self.navigator().last_child(node)
    }

    /// Display path of the node.
    pub fn path(&self, node: &NodeHandle, include_root: bool) -> Result<String> {
        self.navigator().path(node, include_root)
    }

    /// Depth of the node, root being 0.
    pub fn depth(&self, node: &NodeHandle) -> Result<usize> {
        self.navigator().depth(node)
    }

    /// Number of direct children.
    pub fn count_children(&self, node: &NodeHandle) -> Result<usize> {
        self.navigator().count_children(node)
    }

    /// Number of descendants.
    pub fn count_descendants(&self, node: &NodeHandle) -> Result<i64> {
        self.navigator().count_descendants(node)
    }

    /// Materializes the subtree under `node` as a nested structure.
    pub fn dump_tree(&self, node: &NodeHandle) -> Result<TreeDump> {
        dump::dump_tree(&self.navigator(), &self.config, node)
    }

    // ---- mutation ---------------------------------------------------

    /// Starts an attach of a new node carrying the given domain fields.
    pub fn attach(&self, fields: BTreeMap<String, Value>) -> AttachRequest<'_, S> {
        AttachRequest::new(self, fields)
    }

    /// Starts a relocation of an existing subtree.
    pub fn relocate(&self, node: &NodeHandle) -> MoveRequest<'_, S> {
        MoveRequest::new(self, node.clone())
    }

    /// Deletes a single node, pulling its children up one level.
    ///
    /// Refused for a root with more than one child.
    pub fn delete_node(&self, node: &NodeHandle) -> Result<()> {
        mutate::delete_node(self, node)
    }

    /// Deletes a node and its whole subtree, bottom-up. Returns the
    /// number of rows removed.
    pub fn delete_subtree(&self, node: &NodeHandle) -> Result<usize> {
        mutate::delete_subtree(self, node)
    }

    /// Updates domain fields of a node. Boundary and discriminator
    /// columns are read-only here; only the mutator writes them.
    pub fn update_fields(&self, node: &NodeHandle, fields: BTreeMap<String, Value>) -> Result<()> {
        for name in fields.keys() {
            if self.config.is_read_only(name) {
                return Err(TreeError::InvalidOperation(format!(
                    "field `{name}` is read-only and can not be changed"
                )));
            }
        }
        {
            let mut row = node.write();
            for (name, value) in fields {
                row.set(name, value);
            }
        }
        if !self.store.save(node)? {
            return Err(TreeError::NotFound("node"));
        }
        Ok(())
    }
}
