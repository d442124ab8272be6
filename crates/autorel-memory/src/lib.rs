//! In-memory collaborators for autorel.
//!
//! `MemoryDatabase` is a schema catalog and model registry over tables held
//! in memory, `MemoryModel` the model handle it hands out, and `MemoryCache`
//! an external cache. All of them count their calls so tests can assert on
//! caching behavior.

pub mod cache;
pub mod database;
pub mod model;

pub use cache::MemoryCache;
pub use database::MemoryDatabase;
pub use model::MemoryModel;
