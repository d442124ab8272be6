//! Table and model identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured name of a table/model: a package (namespace) plus a local name.
///
/// Tables of one package share the `<package>_` name prefix in the schema,
/// so `TableIdentity::new("blog", "posts")` refers to the table `blog_posts`.
/// Related identities are derived by substituting the local name.
///
/// The `Display` form (`blog.posts`) is stable and is used to build
/// external cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdentity {
    package: String,
    name: String,
}

impl TableIdentity {
    /// Create a new identity.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// The package (namespace) this table belongs to.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The local name, without the package prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derive an identity in the same package with a different local name.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            package: self.package.clone(),
            name: name.into(),
        }
    }

    /// The (prefix-stripped) schema table name: `<package>_<name>`.
    pub fn table_name(&self) -> String {
        format!("{}_{}", self.package, self.name)
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_and_prefix() {
        let id = TableIdentity::new("blog", "posts");
        assert_eq!(id.table_name(), "blog_posts");
        assert_eq!(id.to_string(), "blog.posts");
    }

    #[test]
    fn test_with_name_keeps_package() {
        let id = TableIdentity::new("blog", "posts").with_name("posts_categories");
        assert_eq!(id.package(), "blog");
        assert_eq!(id.name(), "posts_categories");
    }
}
