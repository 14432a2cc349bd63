//! Row and mirror types shared across the engine.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ForestConfig;
use crate::error::{Result, TreeError};
use crate::query::Value;
use crate::tree::Interval;

/// Primary key of a row in the backing table.
pub type NodeId = u64;

/// Sentinel id for rows not yet persisted; the store allocates a real id
/// on insert.
pub const NULL_NODE_ID: NodeId = 0;

/// One row of the backing table: a primary key plus named scalar fields.
///
/// The boundary markers, forest discriminator, and title live in `fields`
/// under the names chosen by [`ForestConfig`]; everything else is opaque
/// domain data the tree algorithm never inspects.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Primary key.
    pub id: NodeId,
    /// Named scalar fields.
    pub fields: BTreeMap<String, Value>,
}

impl Row {
    /// Creates an empty row with the given id.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Creates an unpersisted row carrying the given fields.
    pub fn with_fields(fields: BTreeMap<String, Value>) -> Self {
        Self {
            id: NULL_NODE_ID,
            fields,
        }
    }

    /// Returns a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field by name.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Reads a field as an integer, failing if it is absent or non-integer.
    pub fn int(&self, name: &str) -> Result<i64> {
        self.get(name)
            .and_then(Value::as_int)
            .ok_or_else(|| TreeError::FieldType {
                field: name.to_owned(),
                expected: "an integer",
            })
    }
}

/// In-memory mirror of a row.
///
/// The backing table owns the authoritative values; a handle is a cached
/// copy registered with the store's mirror registry so that bulk boundary
/// shifts patch it in place. Loading the same row twice through one store
/// yields the same mirror.
#[derive(Clone, Debug)]
pub struct NodeHandle(Arc<RwLock<Row>>);

impl NodeHandle {
    pub(crate) fn new(row: Row) -> Self {
        Self(Arc::new(RwLock::new(row)))
    }

    pub(crate) fn downgrade(&self) -> Weak<RwLock<Row>> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn from_arc(arc: Arc<RwLock<Row>>) -> Self {
        Self(arc)
    }

    /// Primary key of the mirrored row.
    pub fn id(&self) -> NodeId {
        self.0.read().id
    }

    /// Read access to the mirrored row.
    pub fn read(&self) -> RwLockReadGuard<'_, Row> {
        self.0.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Row> {
        self.0.write()
    }

    /// Returns a copy of a field by name.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.read().get(name).cloned()
    }

    /// Returns the boundary markers of this node.
    pub fn interval(&self, config: &ForestConfig) -> Result<Interval> {
        let row = self.0.read();
        Ok(Interval {
            left: row.int(config.left())?,
            right: row.int(config.right())?,
        })
    }

    /// Returns the forest discriminator value, if the model is multi-tree
    /// and the row carries one.
    pub fn tree_value(&self, config: &ForestConfig) -> Option<Value> {
        let field = config.tree()?;
        let value = self.0.read().get(field).cloned()?;
        match value {
            Value::Null => None,
            other => Some(other),
        }
    }

    /// True when both handles mirror the same row.
    pub fn same_node(&self, other: &NodeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
