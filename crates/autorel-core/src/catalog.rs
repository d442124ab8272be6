//! Schema catalog contract.
//!
//! The association layer never talks to a database directly. Everything it
//! needs to know about the schema comes through a [`SchemaCatalog`].

use crate::Result;
use crate::identity::TableIdentity;
use serde::{Deserialize, Serialize};

/// Information about a table column, as far as association inference cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Whether this is part of the primary key
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// Create a regular (non-key) column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: false,
        }
    }

    /// Create a primary-key column.
    pub fn primary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: true,
        }
    }
}

/// Source of table and column metadata.
pub trait SchemaCatalog: Send + Sync {
    /// List every table name known to the schema, with the database table
    /// prefix already stripped (see [`strip_table_prefix`]).
    ///
    /// Order is preserved by the inference engine.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Column descriptors of a table, in their natural order.
    fn columns_of(&self, table: &TableIdentity) -> Result<Vec<ColumnDescriptor>>;
}

/// Keep only the table names carrying `prefix`, with the prefix removed.
///
/// Names without the prefix belong to another application sharing the
/// database and are dropped. An empty prefix keeps every name.
///
/// ```
/// use autorel_core::strip_table_prefix;
///
/// let raw = ["jos_blog_posts", "jos_blog_users", "other_table"];
/// assert_eq!(strip_table_prefix(raw, "jos_"), vec!["blog_posts", "blog_users"]);
/// ```
pub fn strip_table_prefix<I, S>(raw_names: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw_names
        .into_iter()
        .filter_map(|name| name.as_ref().strip_prefix(prefix).map(str::to_string))
        .collect()
}
