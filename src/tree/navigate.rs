//! Read-only tree navigation.
//!
//! Every operation translates into a range comparison over the boundary
//! columns and is executed by the store; nothing here mutates the table.

use crate::config::ForestConfig;
use crate::error::{Result, TreeError};
use crate::model::NodeHandle;
use crate::query::{Cmp, SortDir, TreeQuery, Value};
use crate::store::TreeStore;
use crate::tree::Interval;

/// Navigation queries over one forest.
pub struct TreeNavigator<'e, S: TreeStore> {
    store: &'e S,
    config: &'e ForestConfig,
}

impl<'e, S: TreeStore> TreeNavigator<'e, S> {
    /// Creates a navigator over the given store and configuration.
    pub fn new(store: &'e S, config: &'e ForestConfig) -> Self {
        Self { store, config }
    }

    /// Resolves the forest scope of a subject node. Multi-tree models
    /// require the subject to carry a discriminator value.
    pub fn scope(&self, subject: &NodeHandle) -> Result<Option<Value>> {
        if self.config.tree().is_none() {
            return Ok(None);
        }
        subject
            .tree_value(self.config)
            .map(Some)
            .ok_or_else(|| {
                TreeError::InvalidOperation("tree id required, but none is defined".to_owned())
            })
    }

    fn scoped_query(&self, tree: Option<&Value>) -> TreeQuery {
        let mut query = TreeQuery::new();
        if let (Some(field), Some(value)) = (self.config.tree(), tree) {
            query = query.filter(field, Cmp::Eq, value.clone());
        }
        query
    }

    /// The root of the given forest, if any.
    pub fn root(&self, tree: Option<&Value>) -> Result<Option<NodeHandle>> {
        if self.config.tree().is_some() && tree.is_none() {
            return Err(TreeError::InvalidOperation(
                "tree id required, but none is defined".to_owned(),
            ));
        }
        let query = self
            .scoped_query(tree)
            .filter(self.config.left(), Cmp::Eq, 1i64);
        self.store.fetch_one(&query)
    }

    /// Every root across all forests in the table. No forest filter.
    pub fn roots(&self) -> Result<Vec<NodeHandle>> {
        let query = TreeQuery::new().filter(self.config.left(), Cmp::Eq, 1i64);
        self.store.fetch(&query)
    }

    /// The tightest interval strictly enclosing the subject.
    pub fn parent(&self, subject: &NodeHandle) -> Result<Option<NodeHandle>> {
        let iv = subject.interval(self.config)?;
        let tree = self.scope(subject)?;
        let query = self
            .scoped_query(tree.as_ref())
            .filter(self.config.left(), Cmp::Lt, iv.left)
            .filter(self.config.right(), Cmp::Gt, iv.right)
            .order_by(self.config.right(), SortDir::Asc);
        self.store.fetch_one(&query)
    }

    /// A refinable query over the subject's descendants, left-ordered.
    pub fn descendants_query(&self, subject: &NodeHandle) -> Result<TreeQuery> {
        let iv = subject.interval(self.config)?;
        let tree = self.scope(subject)?;
        Ok(self
            .scoped_query(tree.as_ref())
            .filter(self.config.left(), Cmp::Gt, iv.left)
            .filter(self.config.right(), Cmp::Lt, iv.right)
            .order_by(self.config.left(), SortDir::Asc))
    }

    /// Every descendant of the subject in tree (left) order.
    pub fn descendants(&self, subject: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.store.fetch(&self.descendants_query(subject)?)
    }

    /// Descendants without children of their own.
    pub fn leaf_descendants(&self, subject: &NodeHandle) -> Result<Vec<NodeHandle>> {
        let all = self.descendants(subject)?;
        let mut out = Vec::new();
        for node in all {
            if node.interval(self.config)?.is_leaf() {
                out.push(node);
            }
        }
        Ok(out)
    }

    /// Direct children of the subject in tree order: descendants with no
    /// intermediate containing node.
    pub fn children(&self, subject: &NodeHandle) -> Result<Vec<NodeHandle>> {
        let descendants = self.descendants(subject)?;
        let mut children = Vec::new();
        // Left-ordered scan: each child covers its whole subtree, so the
        // next node past the current child's right bound is a child too.
        let mut bound = subject.interval(self.config)?.left;
        for node in descendants {
            let iv = node.interval(self.config)?;
            if iv.left > bound {
                bound = iv.right;
                children.push(node);
            }
        }
        Ok(children)
    }

    /// All ancestors of the subject, root first.
    pub fn ancestors(&self, subject: &NodeHandle) -> Result<Vec<NodeHandle>> {
        let mut chain = Vec::new();
        let mut cursor = subject.clone();
        while let Some(parent) = self.parent(&cursor)? {
            chain.push(parent.clone());
            cursor = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Children of the subject's parent, the subject included. A root has
    /// no siblings.
    pub fn siblings(&self, subject: &NodeHandle) -> Result<Vec<NodeHandle>> {
        match self.parent(subject)? {
            Some(parent) => self.children(&parent),
            None => Ok(Vec::new()),
        }
    }

    /// The sibling immediately before the subject.
    pub fn previous_sibling(&self, subject: &NodeHandle) -> Result<Option<NodeHandle>> {
        let iv = subject.interval(self.config)?;
        let tree = self.scope(subject)?;
        let query = self
            .scoped_query(tree.as_ref())
            .filter(self.config.right(), Cmp::Eq, iv.left - 1);
        self.store.fetch_one(&query)
    }

    /// The sibling immediately after the subject.
    pub fn next_sibling(&self, subject: &NodeHandle) -> Result<Option<NodeHandle>> {
        let iv = subject.interval(self.config)?;
        let tree = self.scope(subject)?;
        let query = self
            .scoped_query(tree.as_ref())
            .filter(self.config.left(), Cmp::Eq, iv.right + 1);
        self.store.fetch_one(&query)
    }

    /// The first child of the subject.
    pub fn first_child(&self, subject: &NodeHandle) -> Result<Option<NodeHandle>> {
        let iv = subject.interval(self.config)?;
        let tree = self.scope(subject)?;
        let query = self
            .scoped_query(tree.as_ref())
            .filter(self.config.left(), Cmp::Eq, iv.left + 1);
        self.store.fetch_one(&query)
    }

    /// The last child of the subject.
    pub fn last_child(&self, subject: &NodeHandle) -> Result<Option<NodeHandle>> {
        let iv = subject.interval(self.config)?;
        let tree = self.scope(subject)?;
        let query = self
            .scoped_query(tree.as_ref())
            .filter(self.config.right(), Cmp::Eq, iv.right - 1);
        self.store.fetch_one(&query)
    }

    /// Display path of the subject: ancestor titles plus the subject's own
    /// title, joined by the configured delimiter. Requires a title column.
    pub fn path(&self, subject: &NodeHandle, include_root: bool) -> Result<String> {
        let Some(title_field) = self.config.title_column() else {
            return Err(TreeError::Configuration(
                "path() requires a configured title column".to_owned(),
            ));
        };
        let mut segments = Vec::new();
        for ancestor in self.ancestors(subject)? {
            if !include_root && ancestor.interval(self.config)?.is_root() {
                continue;
            }
            segments.push(self.title_of(&ancestor, title_field)?);
        }
        segments.push(self.title_of(subject, title_field)?);
        Ok(segments.join(self.config.delimiter()))
    }

    fn title_of(&self, node: &NodeHandle, title_field: &str) -> Result<String> {
        node.field(title_field)
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| TreeError::FieldType {
                field: title_field.to_owned(),
                expected: "a string",
            })
    }

    /// Depth of the subject, root being 0: the number of intervals that
    /// strictly contain it.
    pub fn depth(&self, subject: &NodeHandle) -> Result<usize> {
        let iv = subject.interval(self.config)?;
        let tree = self.scope(subject)?;
        let query = self
            .scoped_query(tree.as_ref())
            .filter(self.config.left(), Cmp::Lt, iv.left)
            .filter(self.config.right(), Cmp::Gt, iv.right);
        Ok(self.store.fetch(&query)?.len())
    }

    /// Number of direct children.
    pub fn count_children(&self, subject: &NodeHandle) -> Result<usize> {
        Ok(self.children(subject)?.len())
    }

    /// Number of descendants, derived from the interval width alone.
    pub fn count_descendants(&self, subject: &NodeHandle) -> Result<i64> {
        Ok(subject.interval(self.config)?.count_descendants())
    }

    /// True when the subject is a forest root.
    pub fn is_root(&self, subject: &NodeHandle) -> Result<bool> {
        Ok(subject.interval(self.config)?.is_root())
    }

    /// True when the subject has no children.
    pub fn is_leaf(&self, subject: &NodeHandle) -> Result<bool> {
        Ok(subject.interval(self.config)?.is_leaf())
    }

    /// True when the subject sits below some parent, i.e. is not a root.
    pub fn is_child(&self, subject: &NodeHandle) -> Result<bool> {
        Ok(!subject.interval(self.config)?.is_root())
    }

    /// True when the subject has children.
    pub fn has_children(&self, subject: &NodeHandle) -> Result<bool> {
        Ok(!subject.interval(self.config)?.is_leaf())
    }

    /// True when the subject is not a root.
    pub fn has_parent(&self, subject: &NodeHandle) -> Result<bool> {
        Ok(!subject.interval(self.config)?.is_root())
    }

    /// True when a sibling precedes the subject.
    pub fn has_previous_sibling(&self, subject: &NodeHandle) -> Result<bool> {
        Ok(self.previous_sibling(subject)?.is_some())
    }

    /// True when a sibling follows the subject.
    pub fn has_next_sibling(&self, subject: &NodeHandle) -> Result<bool> {
        Ok(self.next_sibling(subject)?.is_some())
    }

    /// True when `a` is an ancestor of `b`.
    pub fn is_ancestor_of(&self, a: &NodeHandle, b: &NodeHandle) -> Result<bool> {
        Ok(self.is_same_tree_as(a, b)?
            && a.interval(self.config)?
                .is_ancestor_of(&b.interval(self.config)?))
    }

    /// True when `a` is a descendant of `b`.
    pub fn is_descendant_of(&self, a: &NodeHandle, b: &NodeHandle) -> Result<bool> {
        self.is_ancestor_of(b, a)
    }

    /// True when `a` is the direct parent of `b`.
    pub fn is_parent_of(&self, a: &NodeHandle, b: &NodeHandle) -> Result<bool> {
        Ok(self
            .parent(b)?
            .is_some_and(|parent| parent.id() == a.id()))
    }

    /// True when `a` is a direct child of `b`.
    pub fn is_child_of(&self, a: &NodeHandle, b: &NodeHandle) -> Result<bool> {
        self.is_parent_of(b, a)
    }

    /// True when both nodes belong to the same forest. Always true for
    /// single-tree models; a node without a discriminator matches any.
    pub fn is_same_tree_as(&self, a: &NodeHandle, b: &NodeHandle) -> Result<bool> {
        if self.config.tree().is_none() {
            return Ok(true);
        }
        Ok(match (a.tree_value(self.config), b.tree_value(self.config)) {
            (None, _) | (_, None) => true,
            (Some(va), Some(vb)) => va == vb,
        })
    }
}
