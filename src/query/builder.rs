//! Fluent builder for range/equality conditions over named row fields.
//!
//! A [`TreeQuery`] is the opaque handle the navigator hands back to
//! callers: it can be refined further (extra filters, ordering, a limit)
//! before being executed by a store. Evaluation helpers live here so any
//! store implementation shares the same predicate semantics.

use std::cmp::Ordering;

use crate::model::Row;
use crate::query::Value;

/// Comparison operator applied to a single field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cmp {
    /// Field equals the literal.
    Eq,
    /// Field differs from the literal.
    Ne,
    /// Field is strictly less than the literal.
    Lt,
    /// Field is less than or equal to the literal.
    Le,
    /// Field is strictly greater than the literal.
    Gt,
    /// Field is greater than or equal to the literal.
    Ge,
}

/// Sort direction for an ordering key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDir {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// One field comparison.
#[derive(Clone, Debug)]
pub struct Filter {
    /// Field name the comparison applies to.
    pub field: String,
    /// Comparison operator.
    pub cmp: Cmp,
    /// Literal to compare against.
    pub value: Value,
}

/// A conjunctive filter/sort/limit condition over the backing table.
#[derive(Clone, Debug, Default)]
pub struct TreeQuery {
    filters: Vec<Filter>,
    order: Vec<(String, SortDir)>,
    limit: Option<usize>,
}

impl TreeQuery {
    /// Creates an empty query matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field comparison. All comparisons must hold for a row to
    /// match.
    pub fn filter(mut self, field: impl Into<String>, cmp: Cmp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            cmp,
            value: value.into(),
        });
        self
    }

    /// Appends an ordering key.
    pub fn order_by(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.order.push((field.into(), dir));
        self
    }

    /// Caps the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Configured row cap, if any.
    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Filters of this query.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Ordering keys of this query.
    pub fn ordering(&self) -> &[(String, SortDir)] {
        &self.order
    }

    /// Evaluates the conjunction against a row.
    ///
    /// Absent fields and mixed-type comparisons never match, for any
    /// operator.
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| {
            let Some(value) = row.get(&f.field) else {
                return false;
            };
            let Some(ordering) = value.compare(&f.value) else {
                return false;
            };
            match f.cmp {
                Cmp::Eq => ordering == Ordering::Equal,
                Cmp::Ne => ordering != Ordering::Equal,
                Cmp::Lt => ordering == Ordering::Less,
                Cmp::Le => ordering != Ordering::Greater,
                Cmp::Gt => ordering == Ordering::Greater,
                Cmp::Ge => ordering != Ordering::Less,
            }
        })
    }

    /// Compares two rows according to the ordering keys. Rows missing an
    /// ordering field sort before rows carrying it.
    pub fn compare_rows(&self, a: &Row, b: &Row) -> Ordering {
        for (field, dir) in &self.order {
            let ordering = match (a.get(field), b.get(field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(va), Some(vb)) => va.compare(vb).unwrap_or(Ordering::Equal),
            };
            let ordering = match dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
