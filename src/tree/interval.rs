//! Pure interval predicates of the nested-set encoding.
//!
//! A node is a numeric interval `[left, right]`; containment of intervals
//! encodes ancestry. Everything here is side-effect free; predicates that
//! need a store query (depth, children) live in the navigator.

use serde::Serialize;

/// Boundary markers of one node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Interval {
    /// Left boundary marker.
    pub left: i64,
    /// Right boundary marker.
    pub right: i64,
}

impl Interval {
    /// Creates an interval. No validation; invalid pairs surface through
    /// the predicates.
    pub fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }

    /// True for the forest root, the unique node with `left == 1`.
    pub fn is_root(&self) -> bool {
        self.left == 1
    }

    /// True for a node without children.
    pub fn is_leaf(&self) -> bool {
        self.right - self.left == 1
    }

    /// True when `self` strictly contains `other`, i.e. is an ancestor.
    pub fn is_ancestor_of(&self, other: &Interval) -> bool {
        self.left < other.left && self.right > other.right
    }

    /// True when `other` strictly contains `self`.
    pub fn is_descendant_of(&self, other: &Interval) -> bool {
        other.is_ancestor_of(self)
    }

    /// True when the given boundary position falls inside this interval,
    /// boundaries included.
    pub fn contains_position(&self, position: i64) -> bool {
        position >= self.left && position <= self.right
    }

    /// Number of descendants encoded by the interval width.
    pub fn count_descendants(&self) -> i64 {
        (self.right - self.left - 1) / 2
    }

    /// Number of boundary positions the subtree occupies.
    pub fn width(&self) -> i64 {
        self.right - self.left + 1
    }
}
