//! Query-condition layer.
//!
//! Navigation requests are translated into [`TreeQuery`] conditions that a
//! store executes; callers may refine a returned query before running it.

mod builder;
mod value;

pub use builder::{Cmp, Filter, SortDir, TreeQuery};
pub use value::Value;
