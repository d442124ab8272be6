//! Core types and traits for autorel.
//!
//! This crate provides the vocabulary shared by association inference and
//! resolution:
//!
//! - `TableIdentity` for package-qualified table/model names
//! - `SchemaCatalog` for table and column metadata
//! - `ModelRegistry` / `ModelHandle` for fetching related rows
//! - `RelationshipGraph` for inferred associations
//! - `Inflector` for the pluralization rules naming conventions rely on

pub mod catalog;
pub mod error;
pub mod identity;
pub mod inflect;
pub mod model;
pub mod relationship;
pub mod row;
pub mod value;

pub use catalog::{ColumnDescriptor, SchemaCatalog, strip_table_prefix};
pub use error::{
    CatalogError, CatalogErrorKind, ConfigError, Error, QueryError, QueryErrorKind, Result,
};
pub use identity::TableIdentity;
pub use inflect::{EnglishInflector, Inflector, explode};
pub use model::{FilterState, ModelHandle, ModelRegistry, Resolution};
pub use relationship::{KeyMapping, RelationshipDescriptor, RelationshipGraph, RelationshipKind};
pub use row::Row;
pub use value::Value;
