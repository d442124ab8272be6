//! Association inference.
//!
//! [`AssociationEngine::infer`] turns one source table plus the sibling
//! tables of its package into a [`RelationshipGraph`]:
//!
//! 1. Return the memoized graph if there is one (in-process, then external).
//! 2. **1:1 pass**: every non-key `<stem>_id` column whose pluralized stem
//!    names a connected sibling table becomes a one-to-one association.
//!    Primary-key columns are collected along the way.
//! 3. **1:N / N:N pass**: sibling tables are classified by name shape
//!    (`<singular>_*` is one-to-many, `<plural>_*` / `*_<plural>` is
//!    many-to-many). Siblings matching neither shape must contain every
//!    primary-key column of the source table, and are then classified by
//!    their name segments.
//! 4. Memoize the finished graph.
//!
//! The first rule to claim an association name keeps it. Collaborator
//! failures while probing candidates exclude the candidate; they never fail
//! the inference.

use std::collections::HashSet;
use std::sync::Arc;

use autorel_core::{
    ColumnDescriptor, EnglishInflector, Error, Inflector, KeyMapping, ModelRegistry,
    RelationshipDescriptor, RelationshipGraph, Resolution, Result, SchemaCatalog, TableIdentity,
};

use crate::cache::{AssociationCache, ExternalCache};
use crate::config::AssociationConfig;
use crate::naming::{self, NamePatterns, TableShape};

/// Infers relationship graphs from the schema catalog.
pub struct AssociationEngine {
    catalog: Arc<dyn SchemaCatalog>,
    registry: Arc<dyn ModelRegistry>,
    inflector: Arc<dyn Inflector>,
    cache: Arc<AssociationCache>,
    external: Option<Arc<dyn ExternalCache>>,
    config: AssociationConfig,
}

impl std::fmt::Debug for AssociationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationEngine")
            .field("cached_graphs", &self.cache.len())
            .field("external_cache", &self.external.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AssociationEngine {
    /// Create an engine over a catalog and registry, memoizing into `cache`.
    pub fn new(
        catalog: Arc<dyn SchemaCatalog>,
        registry: Arc<dyn ModelRegistry>,
        cache: Arc<AssociationCache>,
    ) -> Self {
        Self {
            catalog,
            registry,
            inflector: Arc::new(EnglishInflector::new()),
            cache,
            external: None,
            config: AssociationConfig::default(),
        }
    }

    /// Use a different inflector.
    pub fn with_inflector(mut self, inflector: Arc<dyn Inflector>) -> Self {
        self.inflector = inflector;
        self
    }

    /// Persist graphs to an external cache as well.
    pub fn with_external_cache(mut self, external: Arc<dyn ExternalCache>) -> Self {
        self.external = Some(external);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: AssociationConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &AssociationConfig {
        &self.config
    }

    /// The inflector used for naming conventions.
    pub fn inflector(&self) -> &Arc<dyn Inflector> {
        &self.inflector
    }

    /// The registry target models are resolved from.
    pub fn registry(&self) -> &Arc<dyn ModelRegistry> {
        &self.registry
    }

    /// The in-process cache.
    pub fn cache(&self) -> &Arc<AssociationCache> {
        &self.cache
    }

    /// Infer the relationship graph of `source`.
    ///
    /// Fails only when the table listing or the source table's own columns
    /// cannot be read; nothing is memoized in that case.
    #[tracing::instrument(level = "debug", skip(self, source), fields(table = %source))]
    pub fn infer(&self, source: &TableIdentity) -> Result<Arc<RelationshipGraph>> {
        if let Some(graph) = self.cache.get(source) {
            tracing::trace!("Association cache hit");
            return Ok(graph);
        }

        if let Some(graph) = self.load_external(source) {
            tracing::debug!(associations = graph.len(), "Loaded associations from external cache");
            return Ok(self.cache.insert(source.clone(), graph));
        }

        let graph = self.compute(source)?;
        tracing::debug!(associations = graph.len(), "Inferred associations");

        self.store_external(source, &graph);
        Ok(self.cache.insert(source.clone(), graph))
    }

    /// Like [`infer`](Self::infer), but a failure yields an empty graph.
    pub fn associations(&self, source: &TableIdentity) -> Arc<RelationshipGraph> {
        self.infer(source).unwrap_or_else(|e| {
            tracing::warn!(table = %source, error = %e, "Association inference failed");
            Arc::new(RelationshipGraph::new())
        })
    }

    fn compute(&self, source: &TableIdentity) -> Result<RelationshipGraph> {
        let tables = self.cache.tables_or_load(|| self.catalog.list_tables())?;
        let columns = self.catalog.columns_of(source)?;

        let mut graph = RelationshipGraph::new();
        let table_set: HashSet<&str> = tables.iter().map(String::as_str).collect();
        let primary_keys = self.one_to_one_pass(source, &columns, &table_set, &mut graph);
        self.sibling_pass(source, &primary_keys, &tables, &mut graph)?;
        Ok(graph)
    }

    /// Register one-to-one associations; returns the primary-key columns in
    /// column order.
    fn one_to_one_pass(
        &self,
        source: &TableIdentity,
        columns: &[ColumnDescriptor],
        tables: &HashSet<&str>,
        graph: &mut RelationshipGraph,
    ) -> Vec<String> {
        let mut primary_keys = Vec::new();

        for column in columns {
            if column.primary_key {
                primary_keys.push(column.name.clone());
                continue;
            }
            let Some(stem) = naming::foreign_key_stem(&column.name) else {
                continue;
            };

            let (name, plural) = naming::one_to_one_names(stem, self.inflector.as_ref());
            if graph.contains(&name) {
                continue;
            }
            let target = source.with_name(plural);
            if !tables.contains(target.table_name().as_str()) {
                tracing::trace!(column = %column.name, target = %target, "No table for foreign key");
                continue;
            }
            if !self.is_connected(&target) {
                tracing::trace!(column = %column.name, target = %target, "Target model not available");
                continue;
            }

            tracing::debug!(association = %name, kind = "one_one", target = %target, "Registering association");
            graph.claim(
                name,
                RelationshipDescriptor::one_to_one(target, KeyMapping::new().with("id", column.name.clone())),
            );
        }

        primary_keys
    }

    /// Register one-to-many and many-to-many associations from sibling tables.
    fn sibling_pass(
        &self,
        source: &TableIdentity,
        primary_keys: &[String],
        tables: &[String],
        graph: &mut RelationshipGraph,
    ) -> Result<()> {
        if primary_keys.is_empty() {
            tracing::debug!("Source table has no primary key, skipping collection associations");
            return Ok(());
        }

        let patterns = NamePatterns::new(source.name(), self.inflector.as_ref())
            .map_err(|e| Error::Custom(format!("invalid naming pattern for {source}: {e}")))?;
        let keys = KeyMapping::identity(primary_keys.iter().map(String::as_str));

        let siblings = tables
            .iter()
            .filter_map(|table| naming::strip_package_prefix(table, source.package()))
            .filter(|remainder| *remainder != source.name());

        for remainder in siblings {
            let shape = match patterns.classify(remainder) {
                TableShape::Unmatched => {
                    if !self.contains_primary_keys(&source.with_name(remainder), primary_keys) {
                        continue;
                    }
                    naming::classify_by_segments(remainder, self.inflector.as_ref())
                }
                shape => shape,
            };
            tracing::trace!(sibling = remainder, shape = ?shape, "Classified sibling table");

            let (name, descriptor) = match shape {
                TableShape::OneToMany => (
                    patterns.one_to_many_name(remainder),
                    RelationshipDescriptor::one_to_many(source.with_name(remainder), keys.clone()),
                ),
                TableShape::ManyToMany => {
                    let name = patterns.many_to_many_name(remainder);
                    let descriptor = RelationshipDescriptor::many_to_many(
                        source.with_name(name.as_str()),
                        keys.clone(),
                        source.with_name(remainder),
                    );
                    (name, descriptor)
                }
                TableShape::Unmatched => continue,
            };

            if name.is_empty() || graph.contains(&name) {
                continue;
            }
            tracing::debug!(
                association = %name,
                kind = ?descriptor.kind(),
                target = %descriptor.model(),
                "Registering association"
            );
            graph.claim(name, descriptor);
        }

        Ok(())
    }

    /// Whether a sibling table carries every primary-key column of the source.
    fn contains_primary_keys(&self, candidate: &TableIdentity, primary_keys: &[String]) -> bool {
        match self.catalog.columns_of(candidate) {
            Ok(columns) => primary_keys
                .iter()
                .all(|key| columns.iter().any(|column| column.name == *key)),
            Err(e) => {
                tracing::trace!(sibling = %candidate, error = %e, "Column probe failed");
                false
            }
        }
    }

    fn is_connected(&self, target: &TableIdentity) -> bool {
        match self.registry.resolve(target) {
            Resolution::Found(handle) => handle.is_available(),
            Resolution::NotFound | Resolution::Unavailable(_) => false,
        }
    }

    fn load_external(&self, source: &TableIdentity) -> Option<RelationshipGraph> {
        let external = self.external.as_ref().filter(|_| self.config.use_external_cache)?;
        let key = self.config.external_cache_key(source);
        let payload = external.get(&key)?;
        match serde_json::from_str(&payload) {
            Ok(graph) => Some(graph),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Unreadable external cache entry");
                None
            }
        }
    }

    fn store_external(&self, source: &TableIdentity, graph: &RelationshipGraph) {
        let Some(external) = self.external.as_ref().filter(|_| self.config.use_external_cache) else {
            return;
        };
        match serde_json::to_string(graph) {
            Ok(payload) => external.put(&self.config.external_cache_key(source), payload),
            Err(e) => tracing::warn!(table = %source, error = %e, "Could not serialize associations"),
        }
    }
}
