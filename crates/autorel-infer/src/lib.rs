//! Association inference for autorel.
//!
//! Discovers one-to-one, one-to-many and many-to-many relationships of a
//! table from naming conventions and primary-key containment, without any
//! declared foreign keys.
//!
//! - `naming`: the string heuristics, free of schema I/O
//! - `engine`: `AssociationEngine`, which runs the heuristics against a catalog
//! - `cache`: the in-process memo and the external cache contract
//! - `config`: `AssociationConfig`

pub mod cache;
pub mod config;
pub mod engine;
pub mod naming;

pub use cache::{AssociationCache, ExternalCache};
pub use config::AssociationConfig;
pub use engine::AssociationEngine;
pub use naming::{NamePatterns, TableShape};
