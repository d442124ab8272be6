//! Caches for inferred relationship graphs.
//!
//! [`AssociationCache`] is the in-process memo. It is owned explicitly: build
//! one per application context and hand the same `Arc` to every engine that
//! should share results. [`ExternalCache`] is the optional process-external
//! key/value store that survives restarts.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use autorel_core::{RelationshipGraph, Result, TableIdentity};

/// Process-external key/value cache with fetch/store semantics.
///
/// Values are opaque strings; relationship graphs are stored as JSON.
pub trait ExternalCache: Send + Sync {
    /// Fetch a value, or `None` on a miss.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one.
    fn put(&self, key: &str, value: String);
}

/// In-process memo of relationship graphs keyed by source-table identity,
/// plus the shared sibling-table listing.
///
/// Every entry is written at most once. A concurrent computation of the same
/// graph is not coordinated: whichever writer lands first is kept and the
/// other result is discarded.
#[derive(Debug, Default)]
pub struct AssociationCache {
    graphs: RwLock<HashMap<TableIdentity, Arc<RelationshipGraph>>>,
    tables: RwLock<Option<Arc<Vec<String>>>>,
}

impl AssociationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the memoized graph for a source table.
    pub fn get(&self, identity: &TableIdentity) -> Option<Arc<RelationshipGraph>> {
        let graphs = self.graphs.read().unwrap_or_else(|e| e.into_inner());
        graphs.get(identity).cloned()
    }

    /// Memoize a graph, keeping an existing entry if one is already there.
    ///
    /// Returns the graph that ends up cached.
    pub fn insert(&self, identity: TableIdentity, graph: RelationshipGraph) -> Arc<RelationshipGraph> {
        let mut graphs = self.graphs.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(graphs.entry(identity).or_insert_with(|| Arc::new(graph)))
    }

    /// Check whether a graph is memoized for a source table.
    pub fn contains(&self, identity: &TableIdentity) -> bool {
        let graphs = self.graphs.read().unwrap_or_else(|e| e.into_inner());
        graphs.contains_key(identity)
    }

    /// Number of memoized graphs.
    pub fn len(&self) -> usize {
        let graphs = self.graphs.read().unwrap_or_else(|e| e.into_inner());
        graphs.len()
    }

    /// Check if no graph is memoized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The shared table listing, loading it with `load` on first use.
    ///
    /// A failed load is not memoized; the next caller tries again.
    pub fn tables_or_load(&self, load: impl FnOnce() -> Result<Vec<String>>) -> Result<Arc<Vec<String>>> {
        {
            let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
            if let Some(tables) = tables.as_ref() {
                return Ok(Arc::clone(tables));
            }
        }

        let loaded = Arc::new(load()?);
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(tables.get_or_insert(loaded)))
    }

    /// Drop every memoized graph and the table listing.
    pub fn clear(&self) {
        self.graphs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        *self.tables.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorel_core::{Error, KeyMapping, RelationshipDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn graph_with(name: &str) -> RelationshipGraph {
        let mut graph = RelationshipGraph::new();
        graph.claim(
            name,
            RelationshipDescriptor::one_to_one(
                TableIdentity::new("blog", "authors"),
                KeyMapping::new().with("id", "author_id"),
            ),
        );
        graph
    }

    #[test]
    fn test_insert_is_write_once() {
        let cache = AssociationCache::new();
        let posts = TableIdentity::new("blog", "posts");
        cache.insert(posts.clone(), graph_with("author"));
        let kept = cache.insert(posts.clone(), graph_with("writer"));
        assert!(kept.contains("author"));
        assert!(!kept.contains("writer"));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&posts));
    }

    #[test]
    fn test_tables_loaded_once() {
        let cache = AssociationCache::new();
        let loads = AtomicUsize::new(0);
        let load = || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["blog_posts".to_string()])
        };
        let first = cache.tables_or_load(load).unwrap();
        let second = cache
            .tables_or_load(|| {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_failed_table_load_is_retried() {
        let cache = AssociationCache::new();
        assert!(
            cache
                .tables_or_load(|| Err(Error::Custom("catalog offline".to_string())))
                .is_err()
        );
        let tables = cache
            .tables_or_load(|| Ok(vec!["blog_posts".to_string()]))
            .unwrap();
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = AssociationCache::new();
        cache.insert(TableIdentity::new("blog", "posts"), RelationshipGraph::new());
        cache.clear();
        assert!(cache.is_empty());
    }
}
