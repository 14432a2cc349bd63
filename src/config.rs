//! Per-model forest configuration.

use crate::error::{Result, TreeError};

/// Field-name configuration for one tree-shaped model.
///
/// Resolved once when the engine opens and passed by reference to every
/// component; the field names are never looked up dynamically after that.
/// The boundary columns (and the discriminator column, when configured)
/// are read-only for the generic field-update path: only the mutator
/// writes them.
#[derive(Debug, Clone)]
pub struct ForestConfig {
    left_field: String,
    right_field: String,
    tree_field: Option<String>,
    title_field: Option<String>,
    path_delimiter: String,
    primary_key: Vec<String>,
    read_only: Vec<String>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            left_field: "left_id".to_owned(),
            right_field: "right_id".to_owned(),
            tree_field: None,
            title_field: None,
            path_delimiter: "/".to_owned(),
            primary_key: vec!["id".to_owned()],
            read_only: Vec::new(),
        }
    }
}

impl ForestConfig {
    /// Creates the default single-tree configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the left boundary column name.
    pub fn left_field(mut self, name: impl Into<String>) -> Self {
        self.left_field = name.into();
        self
    }

    /// Overrides the right boundary column name.
    pub fn right_field(mut self, name: impl Into<String>) -> Self {
        self.right_field = name.into();
        self
    }

    /// Enables multi-tree mode with the given discriminator column.
    pub fn multi_tree(mut self, name: impl Into<String>) -> Self {
        self.tree_field = Some(name.into());
        self
    }

    /// Configures the title column used to build display paths.
    pub fn title(mut self, name: impl Into<String>) -> Self {
        self.title_field = Some(name.into());
        self
    }

    /// Overrides the path delimiter (default `/`).
    pub fn path_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.path_delimiter = delimiter.into();
        self
    }

    /// Overrides the primary key column list. Compound keys are rejected
    /// at resolve time.
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Marks additional columns as protected against direct updates.
    pub fn protect(mut self, name: impl Into<String>) -> Self {
        self.read_only.push(name.into());
        self
    }

    /// Validates the configuration and computes the read-only column set.
    pub(crate) fn resolved(mut self) -> Result<Self> {
        if self.primary_key.len() != 1 {
            return Err(TreeError::Configuration(format!(
                "tree models do not support compound primary keys (got {} columns)",
                self.primary_key.len()
            )));
        }
        if self.left_field == self.right_field {
            return Err(TreeError::Configuration(
                "left and right boundary columns must differ".to_owned(),
            ));
        }
        for name in [Some(&self.left_field), Some(&self.right_field), self.tree_field.as_ref()]
            .into_iter()
            .flatten()
        {
            if !self.read_only.iter().any(|c| c == name) {
                self.read_only.push(name.clone());
            }
        }
        Ok(self)
    }

    /// Name of the left boundary column.
    pub fn left(&self) -> &str {
        &self.left_field
    }

    /// Name of the right boundary column.
    pub fn right(&self) -> &str {
        &self.right_field
    }

    /// Name of the discriminator column, when multi-tree.
    pub fn tree(&self) -> Option<&str> {
        self.tree_field.as_deref()
    }

    /// Name of the title column, when configured.
    pub fn title_column(&self) -> Option<&str> {
        self.title_field.as_deref()
    }

    /// Delimiter used when concatenating titles into a path.
    pub fn delimiter(&self) -> &str {
        &self.path_delimiter
    }

    /// True when the column may not be written through the generic
    /// field-update path.
    pub fn is_read_only(&self, name: &str) -> bool {
        self.read_only.iter().any(|c| c == name)
    }
}
