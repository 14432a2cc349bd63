//! Canopy: a nested-set (interval-encoded) tree engine over a flat
//! relational table.
//!
//! Each row carries two integer boundary markers (and, optionally, a
//! forest discriminator); containment of the `[left, right]` intervals
//! encodes ancestry, so navigation becomes range comparison and mutation
//! becomes bulk boundary shifting. The engine keeps every marker globally
//! consistent under insert, relocate, and delete, including the in-memory
//! mirrors of rows the current operation did not otherwise touch.
//!
//! ```rust
//! use canopy::{ForestConfig, MemoryStore, TreeEngine, Value};
//! use std::collections::BTreeMap;
//!
//! let engine = TreeEngine::open(
//!     MemoryStore::new(),
//!     ForestConfig::new().title("title"),
//! )?;
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("title".to_owned(), Value::from("home"));
//! let root = engine.attach(fields.clone()).as_root().save()?;
//!
//! fields.insert("title".to_owned(), Value::from("news"));
//! let news = engine.attach(fields).last_child_of(&root).save()?;
//!
//! assert_eq!(engine.path(&news, true)?, "home/news");
//! # Ok::<(), canopy::TreeError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod store;
pub mod tree;

pub use config::ForestConfig;
pub use error::{Result, TreeError};
pub use model::{NodeHandle, NodeId, Row, NULL_NODE_ID};
pub use query::{Cmp, SortDir, TreeQuery, Value};
pub use store::{MemoryStore, MirrorRegistry, ShiftKind, ShiftSpec, TreeStore, UpdateOrder};
pub use tree::{AttachRequest, Interval, MoveRequest, Position, RangeShifter, TreeDump, TreeEngine, TreeNavigator};
