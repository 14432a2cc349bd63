//! Nested export of a subtree.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ForestConfig;
use crate::error::{Result, TreeError};
use crate::model::{NodeHandle, NodeId};
use crate::query::Value;
use crate::store::TreeStore;
use crate::tree::navigate::TreeNavigator;

/// One node of a materialized subtree, children in tree order.
///
/// `path` is populated when the model configures a title column; the
/// subtree root's path is the bare delimiter, every other node appends
/// its title to its parent's path.
#[derive(Clone, Debug, Serialize)]
pub struct TreeDump {
    /// Primary key of the node.
    pub id: NodeId,
    /// All row fields, boundary markers included.
    pub fields: BTreeMap<String, Value>,
    /// Display path, when a title column is configured and present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Child subtrees in tree order.
    pub children: Vec<TreeDump>,
}

impl TreeDump {
    fn from_handle(node: &NodeHandle, path: Option<String>) -> Self {
        let row = node.read();
        Self {
            id: row.id,
            fields: row.fields.clone(),
            path,
            children: Vec::new(),
        }
    }
}

/// Materializes the subtree under `subject` in a single descendants scan.
///
/// A stack of open ancestors tracks where each node attaches; a node
/// whose left bound passes the top entry's right bound closes that
/// ancestor.
pub(crate) fn dump_tree<S: TreeStore>(
    navigator: &TreeNavigator<'_, S>,
    config: &ForestConfig,
    subject: &NodeHandle,
) -> Result<TreeDump> {
    let delimiter = config.delimiter();
    let title_field = config.title_column();

    let root_path = title_field.map(|_| delimiter.to_owned());
    let root = TreeDump::from_handle(subject, root_path);
    let mut stack: Vec<(i64, TreeDump)> = vec![(subject.interval(config)?.right, root)];

    for node in navigator.descendants(subject)? {
        let iv = node.interval(config)?;
        while stack.last().is_some_and(|&(right, _)| iv.left > right) {
            if let Some((_, done)) = stack.pop() {
                if let Some((_, parent)) = stack.last_mut() {
                    parent.children.push(done);
                }
            }
        }
        let path = match (title_field, stack.last()) {
            (Some(field), Some((_, parent))) => {
                match (parent.path.as_ref(), node.field(field).as_ref().and_then(Value::as_str)) {
                    (Some(parent_path), Some(title)) => Some(format!(
                        "{}{delimiter}{title}",
                        parent_path.trim_end_matches(delimiter)
                    )),
                    _ => None,
                }
            }
            _ => None,
        };
        let dump = TreeDump::from_handle(&node, path);
        if iv.is_leaf() {
            if let Some((_, parent)) = stack.last_mut() {
                parent.children.push(dump);
            }
        } else {
            stack.push((iv.right, dump));
        }
    }

    while stack.len() > 1 {
        if let Some((_, done)) = stack.pop() {
            if let Some((_, parent)) = stack.last_mut() {
                parent.children.push(done);
            }
        }
    }
    match stack.pop() {
        Some((_, root)) => Ok(root),
        None => Err(TreeError::Storage(
            "subtree export lost its root entry".to_owned(),
        )),
    }
}
