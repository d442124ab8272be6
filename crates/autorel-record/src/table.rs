//! Associations-aware tables.

use std::sync::Arc;

use autorel_core::{RelationshipGraph, Row, TableIdentity};
use autorel_infer::AssociationEngine;

use crate::record::Record;
use crate::resolver::RelationResolver;

/// A table that hands its inferred relationship graph to every record it
/// builds.
///
/// Inference runs on the first call to [`associations`](Self::associations)
/// (directly or through [`record`](Self::record)). With `load_associations`
/// turned off in the engine's config the table never infers anything and its
/// records carry an empty graph.
#[derive(Debug, Clone)]
pub struct Table {
    identity: TableIdentity,
    engine: Option<Arc<AssociationEngine>>,
    resolver: RelationResolver,
    declared_methods: Vec<String>,
}

impl Table {
    /// Create a table backed by `engine`.
    pub fn new(identity: TableIdentity, engine: Arc<AssociationEngine>) -> Self {
        let resolver = RelationResolver::new(Arc::clone(engine.registry()), Arc::clone(engine.inflector()));
        let engine = engine.config().load_associations.then_some(engine);
        if engine.is_none() {
            tracing::debug!(table = %identity, "Association loading disabled");
        }
        Self {
            identity,
            engine,
            resolver,
            declared_methods: Vec::new(),
        }
    }

    /// Method names declared by the record type this table produces.
    pub fn with_declared_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// The table's identity.
    pub fn identity(&self) -> &TableIdentity {
        &self.identity
    }

    /// Whether this table infers associations.
    pub fn loads_associations(&self) -> bool {
        self.engine.is_some()
    }

    /// The inferred relationship graph (empty if loading is disabled or
    /// inference failed).
    pub fn associations(&self) -> Arc<RelationshipGraph> {
        match &self.engine {
            Some(engine) => engine.associations(&self.identity),
            None => Arc::new(RelationshipGraph::new()),
        }
    }

    /// Wrap a fetched row as a record.
    pub fn record(&self, row: Row) -> Record {
        self.build(row, self.associations())
    }

    /// Wrap a fetched row as a record with extra associations.
    ///
    /// Inferred associations replace extra ones of the same name.
    pub fn record_with(&self, row: Row, extra: RelationshipGraph) -> Record {
        let mut graph = extra;
        graph.merge(RelationshipGraph::clone(&self.associations()));
        self.build(row, Arc::new(graph))
    }

    /// Wrap every row of a result set.
    pub fn records(&self, rows: impl IntoIterator<Item = Row>) -> Vec<Record> {
        let graph = self.associations();
        rows.into_iter()
            .map(|row| self.build(row, Arc::clone(&graph)))
            .collect()
    }

    fn build(&self, row: Row, graph: Arc<RelationshipGraph>) -> Record {
        Record::new(row, graph, self.resolver.clone()).with_declared_methods(self.declared_methods.iter().cloned())
    }
}
