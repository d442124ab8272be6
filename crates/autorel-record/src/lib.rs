//! Record-level association access for autorel.
//!
//! - `resolver`: builds filter states from a record and fetches related rows
//! - `record`: `Record` and the `AssociationAware` capability
//! - `table`: `Table`, which attaches inference and builds records

pub mod record;
pub mod resolver;
pub mod table;

pub use record::{AssociationAware, Attribute, Dispatch, Record};
pub use resolver::{Associated, RelationResolver, ResolveError};
pub use table::Table;
