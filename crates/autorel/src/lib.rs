//! autorel - relationship discovery by naming convention, with lazy
//! active-record style traversal of related rows.
//!
//! No foreign keys are declared anywhere. Given a table, autorel looks at its
//! columns and at the other tables of its package and infers:
//!
//! - **one-to-one** relationships from `<name>_id` columns pointing at a
//!   `<package>_<names>` table (`posts.author_id` -> `author`)
//! - **one-to-many** relationships from `<singular>_*` tables
//!   (`users` + `user_groups` -> `groups`)
//! - **many-to-many** relationships from `<plural>_*` join tables
//!   (`posts` + `posts_categories` -> `categories`)
//!
//! Records built by a [`Table`] resolve these on demand.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use autorel::prelude::*;
//!
//! let db = Arc::new(MemoryDatabase::new());
//! db.create_table("blog_posts", vec![ColumnDescriptor::primary("id"), ColumnDescriptor::new("author_id")]);
//! db.create_table("blog_authors", vec![ColumnDescriptor::primary("id"), ColumnDescriptor::new("name")]);
//! db.insert("blog_authors", Row::from_pairs([("id", Value::BigInt(7)), ("name", Value::from("Ann"))]))?;
//!
//! let engine = AssociationEngine::new(db.clone(), db.clone(), Arc::new(AssociationCache::new()));
//! let posts = Table::new(TableIdentity::new("blog", "posts"), Arc::new(engine));
//!
//! let mut post = posts.record(Row::from_pairs([("id", Value::BigInt(1)), ("author_id", Value::BigInt(7))]));
//! let author = post.get_associated("author", None).and_then(|a| a.as_one().cloned());
//! assert_eq!(author.and_then(|row| row.get_by_name("name").cloned()), Some(Value::from("Ann")));
//! # Ok::<(), autorel::Error>(())
//! ```

pub use autorel_core::{
    CatalogError, CatalogErrorKind, ColumnDescriptor, ConfigError, EnglishInflector, Error,
    FilterState, Inflector, KeyMapping, ModelHandle, ModelRegistry, QueryError,
    QueryErrorKind, RelationshipDescriptor, RelationshipGraph, RelationshipKind, Resolution, Result,
    Row, SchemaCatalog, TableIdentity, Value, explode, strip_table_prefix,
};
pub use autorel_infer::{
    AssociationCache, AssociationConfig, AssociationEngine, ExternalCache, NamePatterns, TableShape,
    naming,
};
pub use autorel_memory::{MemoryCache, MemoryDatabase, MemoryModel};
pub use autorel_record::{
    Associated, AssociationAware, Attribute, Dispatch, Record, RelationResolver, ResolveError, Table,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use autorel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Associated, AssociationAware, AssociationCache, AssociationConfig, AssociationEngine, Attribute,
        ColumnDescriptor, Dispatch, Error, ExternalCache, FilterState, MemoryCache, MemoryDatabase,
        ModelHandle, ModelRegistry, Record, RelationshipDescriptor, RelationshipGraph, RelationshipKind,
        Result, Row, SchemaCatalog, Table, TableIdentity, Value,
    };
}
