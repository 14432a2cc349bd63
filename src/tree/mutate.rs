//! Tree mutation: attach, relocate, delete.
//!
//! Every mutation runs inside one store transaction; a failure at any
//! step rolls the whole boundary-shift sequence back. Attach and move are
//! exposed as consuming request builders: exactly one position must be
//! selected before `save()` applies the algorithm.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::model::{NodeHandle, Row};
use crate::query::{Cmp, SortDir, TreeQuery, Value};
use crate::store::TreeStore;
use crate::tree::{Interval, TreeEngine};

/// Placement of a node relative to a target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    /// First child of the target.
    FirstChild,
    /// Last child of the target.
    LastChild,
    /// Sibling immediately before the target.
    PrevSibling,
    /// Sibling immediately after the target.
    NextSibling,
}

impl Position {
    /// Left boundary the placed node will occupy, relative to the
    /// target's current interval.
    fn destination(self, target: &Interval) -> i64 {
        match self {
            Position::FirstChild => target.left + 1,
            Position::LastChild => target.right,
            Position::PrevSibling => target.left,
            Position::NextSibling => target.right + 1,
        }
    }
}

enum AttachPlan {
    Root,
    Relative(Position, NodeHandle),
}

/// Pending attach of a new node.
///
/// Created by [`TreeEngine::attach`]; select exactly one position, then
/// call [`AttachRequest::save`].
pub struct AttachRequest<'e, S: TreeStore> {
    engine: &'e TreeEngine<S>,
    fields: BTreeMap<String, Value>,
    tree: Option<Value>,
    plan: Option<AttachPlan>,
    error: Option<TreeError>,
}

impl<'e, S: TreeStore> AttachRequest<'e, S> {
    pub(crate) fn new(engine: &'e TreeEngine<S>, fields: BTreeMap<String, Value>) -> Self {
        Self {
            engine,
            fields,
            tree: None,
            plan: None,
            error: None,
        }
    }

    fn select(mut self, plan: AttachPlan) -> Self {
        if self.plan.is_some() {
            self.error = Some(TreeError::InvalidOperation(
                "an attach position is already selected".to_owned(),
            ));
            return self;
        }
        self.plan = Some(plan);
        self
    }

    /// Attaches into the given forest. Only meaningful for root attaches
    /// on multi-tree models; relative attaches inherit the target's
    /// forest.
    pub fn tree(mut self, value: impl Into<Value>) -> Self {
        self.tree = Some(value.into());
        self
    }

    /// Attach as the root of a new forest.
    pub fn as_root(self) -> Self {
        self.select(AttachPlan::Root)
    }

    /// Attach as the first child of `target`.
    pub fn first_child_of(self, target: &NodeHandle) -> Self {
        self.select(AttachPlan::Relative(Position::FirstChild, target.clone()))
    }

    /// Attach as the last child of `target`.
    pub fn last_child_of(self, target: &NodeHandle) -> Self {
        self.select(AttachPlan::Relative(Position::LastChild, target.clone()))
    }

    /// Attach as the sibling immediately before `target`.
    pub fn prev_sibling_of(self, target: &NodeHandle) -> Self {
        self.select(AttachPlan::Relative(Position::PrevSibling, target.clone()))
    }

    /// Attach as the sibling immediately after `target`.
    pub fn next_sibling_of(self, target: &NodeHandle) -> Self {
        self.select(AttachPlan::Relative(Position::NextSibling, target.clone()))
    }

    /// Applies the attach inside a transaction and returns the new node.
    pub fn save(self) -> Result<NodeHandle> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let Some(plan) = self.plan else {
            return Err(TreeError::InvalidOperation(
                "no attach position selected before save()".to_owned(),
            ));
        };
        let config = self.engine.config();
        for name in self.fields.keys() {
            if config.is_read_only(name) {
                return Err(TreeError::InvalidOperation(format!(
                    "field `{name}` is read-only and can not be set directly"
                )));
            }
        }
        let engine = self.engine;
        let fields = self.fields;
        let tree = self.tree;
        match plan {
            AttachPlan::Root => engine.with_mutation(|| attach_root(engine, fields, tree)),
            AttachPlan::Relative(position, target) => {
                engine.with_mutation(|| attach_relative(engine, fields, tree, position, &target))
            }
        }
    }
}

/// Pending relocation of an existing subtree.
///
/// Created by [`TreeEngine::relocate`]; select exactly one position, then
/// call [`MoveRequest::save`].
pub struct MoveRequest<'e, S: TreeStore> {
    engine: &'e TreeEngine<S>,
    subject: NodeHandle,
    plan: Option<(Position, NodeHandle)>,
    error: Option<TreeError>,
}

impl<'e, S: TreeStore> MoveRequest<'e, S> {
    pub(crate) fn new(engine: &'e TreeEngine<S>, subject: NodeHandle) -> Self {
        Self {
            engine,
            subject,
            plan: None,
            error: None,
        }
    }

    fn select(mut self, position: Position, target: &NodeHandle) -> Self {
        if self.plan.is_some() {
            self.error = Some(TreeError::InvalidOperation(
                "a move position is already selected".to_owned(),
            ));
            return self;
        }
        self.plan = Some((position, target.clone()));
        self
    }

    /// Move the subtree to be the first child of `target`.
    pub fn first_child_of(self, target: &NodeHandle) -> Self {
        self.select(Position::FirstChild, target)
    }

    /// Move the subtree to be the last child of `target`.
    pub fn last_child_of(self, target: &NodeHandle) -> Self {
        self.select(Position::LastChild, target)
    }

    /// Move the subtree to sit immediately before `target`.
    pub fn prev_sibling_of(self, target: &NodeHandle) -> Self {
        self.select(Position::PrevSibling, target)
    }

    /// Move the subtree to sit immediately after `target`.
    pub fn next_sibling_of(self, target: &NodeHandle) -> Self {
        self.select(Position::NextSibling, target)
    }

    /// Applies the move inside a transaction.
    ///
    /// Moving a node to a destination inside its own interval is a benign
    /// no-op: the tree would not change.
    pub fn save(self) -> Result<()> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let Some((position, target)) = self.plan else {
            return Err(TreeError::InvalidOperation(
                "no move position selected before save()".to_owned(),
            ));
        };
        let engine = self.engine;
        let subject = self.subject;

        // Cross-forest moves are rejected at plan time.
        let config = engine.config();
        if config.tree().is_some() {
            let subject_tree = subject.tree_value(config);
            let target_tree = target.tree_value(config);
            if subject_tree != target_tree {
                return Err(TreeError::Conflict(
                    "when moving nodes, both must be part of the same tree".to_owned(),
                ));
            }
        }

        engine.with_mutation(|| move_subtree(engine, &subject, position, &target))
    }
}

fn attach_root<S: TreeStore>(
    engine: &TreeEngine<S>,
    fields: BTreeMap<String, Value>,
    tree: Option<Value>,
) -> Result<NodeHandle> {
    let config = engine.config();
    let tree = match config.tree() {
        Some(_) => Some(match tree {
            Some(value) => value,
            None => next_tree_id(engine)?,
        }),
        None => None,
    };

    // One root per forest.
    let mut probe = TreeQuery::new().filter(config.left(), Cmp::Eq, 1i64);
    if let (Some(field), Some(value)) = (config.tree(), tree.as_ref()) {
        probe = probe.filter(field, Cmp::Eq, value.clone());
    }
    if engine.store().fetch_one(&probe)?.is_some() {
        return Err(TreeError::Conflict(
            "this forest already has a root".to_owned(),
        ));
    }

    let mut row = Row::with_fields(fields);
    row.set(config.left(), Value::Int(1));
    row.set(config.right(), Value::Int(2));
    if let (Some(field), Some(value)) = (config.tree(), tree.as_ref()) {
        row.set(field, value.clone());
    }
    let node = engine.store().insert(row)?;
    debug!(id = node.id(), "root attached");
    Ok(node)
}

/// Allocates the next unused integer forest id.
fn next_tree_id<S: TreeStore>(engine: &TreeEngine<S>) -> Result<Value> {
    let config = engine.config();
    let Some(field) = config.tree() else {
        return Err(TreeError::Configuration(
            "tree id allocation requires a multi-tree model".to_owned(),
        ));
    };
    let query = TreeQuery::new()
        .order_by(field, SortDir::Desc)
        .limit(1);
    let highest = engine.store().fetch_one(&query)?;
    let next = match highest {
        None => 1,
        Some(node) => match node.field(field) {
            Some(Value::Int(v)) => v + 1,
            None | Some(Value::Null) => 1,
            Some(_) => {
                return Err(TreeError::Configuration(format!(
                    "can not auto-allocate a tree id: column `{field}` is not an integer"
                )))
            }
        },
    };
    Ok(Value::Int(next))
}

fn attach_relative<S: TreeStore>(
    engine: &TreeEngine<S>,
    fields: BTreeMap<String, Value>,
    tree: Option<Value>,
    position: Position,
    target: &NodeHandle,
) -> Result<NodeHandle> {
    let config = engine.config();
    let target_iv = target.interval(config)?;
    let target_tree = engine.navigator().scope(target)?;
    if let (Some(requested), Some(actual)) = (tree.as_ref(), target_tree.as_ref()) {
        if requested != actual {
            return Err(TreeError::Conflict(
                "attach target belongs to a different tree".to_owned(),
            ));
        }
    }

    let new_left = position.destination(&target_iv);
    engine
        .shifter()
        .shift_from(target_tree.as_ref(), new_left, 2)?;

    let mut row = Row::with_fields(fields);
    row.set(config.left(), Value::Int(new_left));
    row.set(config.right(), Value::Int(new_left + 1));
    if let (Some(field), Some(value)) = (config.tree(), target_tree.as_ref()) {
        row.set(field, value.clone());
    }
    let node = engine.store().insert(row)?;
    debug!(
        id = node.id(),
        left = new_left,
        right = new_left + 1,
        "node attached"
    );
    Ok(node)
}

fn move_subtree<S: TreeStore>(
    engine: &TreeEngine<S>,
    subject: &NodeHandle,
    position: Position,
    target: &NodeHandle,
) -> Result<()> {
    let config = engine.config();
    let tree = engine.navigator().scope(subject)?;
    let subject_iv = subject.interval(config)?;
    let destination = position.destination(&target.interval(config)?);

    // Moving into one's own subtree would not change the tree.
    if subject_iv.contains_position(destination) {
        return Ok(());
    }

    let width = subject_iv.width();
    let Interval {
        mut left,
        mut right,
    } = subject_iv;

    let shifter = engine.shifter();
    // Open a gap of the subtree's width at the destination.
    shifter.shift_from(tree.as_ref(), destination, width)?;
    // The gap opening may have pushed the subtree itself.
    if left >= destination {
        left += width;
        right += width;
    }
    // Slide the block into the gap, then close the hole left behind.
    shifter.shift_range(tree.as_ref(), left, right, destination - left)?;
    shifter.shift_from(tree.as_ref(), right + 1, -width)?;
    debug!(id = subject.id(), destination, width, "subtree moved");
    Ok(())
}

pub(crate) fn delete_node<S: TreeStore>(engine: &TreeEngine<S>, node: &NodeHandle) -> Result<()> {
    let config = engine.config();
    let iv = node.interval(config)?;
    let tree = engine.navigator().scope(node)?;

    // Deleting a root with multiple children would leave the forest
    // without an unambiguous re-parenting; refuse.
    if iv.is_root() && engine.navigator().count_children(node)? > 1 {
        return Err(TreeError::Conflict(
            "can not delete a tree root with multiple children".to_owned(),
        ));
    }

    engine.with_mutation(|| {
        if !engine.store().delete(node.id())? {
            return Err(TreeError::NotFound("node"));
        }
        let shifter = engine.shifter();
        // Pull the children up one level, then close the 2-wide hole.
        shifter.shift_range(tree.as_ref(), iv.left + 1, iv.right - 1, -1)?;
        shifter.shift_from(tree.as_ref(), iv.right + 1, -2)?;
        debug!(id = node.id(), "node deleted");
        Ok(())
    })
}

pub(crate) fn delete_subtree<S: TreeStore>(
    engine: &TreeEngine<S>,
    node: &NodeHandle,
) -> Result<usize> {
    let config = engine.config();
    let iv = node.interval(config)?;
    let tree = engine.navigator().scope(node)?;

    engine.with_mutation(|| {
        // Bottom-up: descending left order always visits a node before
        // its ancestors, so children rows go first without recursion.
        let mut query = TreeQuery::new()
            .filter(config.left(), Cmp::Gt, iv.left)
            .filter(config.right(), Cmp::Lt, iv.right)
            .order_by(config.left(), SortDir::Desc);
        if let (Some(field), Some(value)) = (config.tree(), tree.as_ref()) {
            query = query.filter(field, Cmp::Eq, value.clone());
        }
        let mut deleted = 0;
        for descendant in engine.store().fetch(&query)? {
            if !engine.store().delete(descendant.id())? {
                return Err(TreeError::NotFound("descendant node"));
            }
            deleted += 1;
        }
        if !engine.store().delete(node.id())? {
            return Err(TreeError::NotFound("node"));
        }
        deleted += 1;
        engine
            .shifter()
            .shift_from(tree.as_ref(), iv.right + 1, -iv.width())?;
        debug!(id = node.id(), deleted, "subtree deleted");
        Ok(deleted)
    })
}
