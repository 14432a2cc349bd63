//! Persistence and transaction collaborator boundary.
//!
//! The tree engine never talks to a concrete backend directly; everything
//! goes through [`TreeStore`]. The crate ships [`MemoryStore`], an
//! in-memory table with snapshot transactions; a relational adapter would
//! translate [`TreeQuery`] conditions and [`ShiftSpec`] bulk updates to
//! SQL instead of evaluating them.

mod memory;
mod mirror;

pub use memory::MemoryStore;
pub use mirror::MirrorRegistry;

use crate::error::Result;
use crate::model::{NodeHandle, NodeId, Row};
use crate::query::{TreeQuery, Value};

/// Row-visiting order for a bulk update.
///
/// Load-bearing against backends with unique constraints on the boundary
/// columns: shifts that increase values must visit rows in descending
/// column order, shifts that decrease values in ascending order, so no
/// intermediate state collides with an untouched row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateOrder {
    /// Visit rows in ascending column order.
    Ascending,
    /// Visit rows in descending column order.
    Descending,
}

impl UpdateOrder {
    /// The safe order for the given delta.
    pub fn for_delta(delta: i64) -> Self {
        if delta < 0 {
            UpdateOrder::Ascending
        } else {
            UpdateOrder::Descending
        }
    }
}

/// Row selector of one bulk boundary update.
#[derive(Clone, Copy, Debug)]
pub enum ShiftKind<'a> {
    /// Add the delta to `column` on every row with `column >= threshold`.
    Column {
        /// Boundary column to adjust.
        column: &'a str,
        /// Inclusive lower bound on the column value.
        threshold: i64,
    },
    /// Add the delta to both boundary columns on every row with
    /// `left >= low && right <= high` (a contiguous subtree block).
    Block {
        /// Left boundary column.
        left: &'a str,
        /// Right boundary column.
        right: &'a str,
        /// Inclusive lower bound on the left column.
        low: i64,
        /// Inclusive upper bound on the right column.
        high: i64,
    },
}

/// One bulk boundary update, restricted to a single forest.
#[derive(Clone, Debug)]
pub struct ShiftSpec<'a> {
    /// Discriminator column and value selecting the forest; `None` in
    /// single-tree mode.
    pub tree_filter: Option<(&'a str, Value)>,
    /// Row selector.
    pub kind: ShiftKind<'a>,
    /// Signed amount added to the selected column(s).
    pub delta: i64,
    /// Required row-visiting order.
    pub order: UpdateOrder,
}

/// Record persistence, query execution, and transaction scope consumed by
/// the tree engine.
///
/// All calls are blocking round-trips. Multi-statement mutations are
/// bracketed by `begin`/`commit`/`rollback`; a store must make the whole
/// bracket atomic.
pub trait TreeStore {
    /// Loads a row by primary key.
    fn load(&self, id: NodeId) -> Result<Option<NodeHandle>>;

    /// Executes a query, returning hydrated mirrors in query order.
    fn fetch(&self, query: &TreeQuery) -> Result<Vec<NodeHandle>>;

    /// Executes a query, returning the first matching mirror.
    fn fetch_one(&self, query: &TreeQuery) -> Result<Option<NodeHandle>>;

    /// Inserts a row, allocating an id when the row carries the null id.
    fn insert(&self, row: Row) -> Result<NodeHandle>;

    /// Writes a mirror's fields back to the table. Returns `false` when
    /// the row no longer exists.
    fn save(&self, node: &NodeHandle) -> Result<bool>;

    /// Deletes a row. Returns `false` when it did not exist.
    fn delete(&self, id: NodeId) -> Result<bool>;

    /// Applies one bulk boundary update and returns the affected row
    /// count. Mirror patching is the shifter's job, not the store's.
    fn bulk_shift(&self, spec: &ShiftSpec<'_>) -> Result<usize>;

    /// Opens a transaction. Nested transactions are a storage error.
    fn begin(&self) -> Result<()>;

    /// Commits the open transaction.
    fn commit(&self) -> Result<()>;

    /// Rolls the open transaction back, restoring both the table and
    /// every live mirror to their pre-transaction state.
    fn rollback(&self) -> Result<()>;

    /// The registry of live mirrors backed by this store.
    fn mirrors(&self) -> &MirrorRegistry;
}
